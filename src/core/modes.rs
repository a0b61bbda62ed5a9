//! Output modes: mode name → sink constructor
//!
//! Every enabled mode is looked up here while loading a configuration.
//! `console`, `file` and `syslog` are registered by default; hosts can
//! register more.

use super::appender::{Appender, Closable, Reloadable};
use super::bootstrap::BootstrapLogger;
use super::config::Section;
use super::error::Result;
use super::log_context::KeyValues;
use super::output_format::OutputFormat;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Default file name of the `file` mode inside the logs directory
pub const DEFAULT_LOG_FILE: &str = "grafana.log";

/// Inputs available to a mode constructor
pub struct ModeContext<'a> {
    pub mode: &'a str,
    pub section: &'a Section,
    pub format: OutputFormat,
    pub logs_dir: &'a Path,
    pub diagnostics: &'a Arc<BootstrapLogger>,
}

/// A constructed sink with the capabilities it supports
pub struct BuiltSink {
    pub appender: Arc<dyn Appender>,
    pub closer: Option<Arc<dyn Closable>>,
    pub reloader: Option<Arc<dyn Reloadable>>,
}

impl BuiltSink {
    /// A sink that can neither be closed nor reloaded
    pub fn new(appender: Arc<dyn Appender>) -> Self {
        Self {
            appender,
            closer: None,
            reloader: None,
        }
    }

    pub fn closable<T: Appender + Closable + 'static>(sink: Arc<T>) -> Self {
        Self {
            appender: sink.clone(),
            closer: Some(sink),
            reloader: None,
        }
    }

    pub fn closable_reloadable<T>(sink: Arc<T>) -> Self
    where
        T: Appender + Closable + Reloadable + 'static,
    {
        Self {
            appender: sink.clone(),
            closer: Some(sink.clone()),
            reloader: Some(sink),
        }
    }

    #[must_use]
    pub fn with_closer(mut self, closer: Arc<dyn Closable>) -> Self {
        self.closer = Some(closer);
        self
    }

    #[must_use]
    pub fn with_reloader(mut self, reloader: Arc<dyn Reloadable>) -> Self {
        self.reloader = Some(reloader);
        self
    }
}

pub type ModeConstructor = Box<dyn Fn(&ModeContext<'_>) -> Result<BuiltSink> + Send + Sync>;

pub struct ModeRegistry {
    constructors: HashMap<String, ModeConstructor>,
}

impl ModeRegistry {
    /// No modes at all
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// `console`, plus `file` and `syslog` where compiled in
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("console", build_console);
        registry.register("file", build_file);
        registry.register("syslog", build_syslog);
        registry
    }

    /// Register (or replace) the constructor of `mode`
    pub fn register<F>(&mut self, mode: impl Into<String>, constructor: F)
    where
        F: Fn(&ModeContext<'_>) -> Result<BuiltSink> + Send + Sync + 'static,
    {
        self.constructors.insert(mode.into(), Box::new(constructor));
    }

    #[must_use]
    pub fn with_mode<F>(mut self, mode: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&ModeContext<'_>) -> Result<BuiltSink> + Send + Sync + 'static,
    {
        self.register(mode, constructor);
        self
    }

    pub fn get(&self, mode: &str) -> Option<&ModeConstructor> {
        self.constructors.get(mode)
    }

    pub fn contains(&self, mode: &str) -> bool {
        self.constructors.contains_key(mode)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn build_console(ctx: &ModeContext<'_>) -> Result<BuiltSink> {
    Ok(BuiltSink::new(Arc::new(
        crate::appenders::ConsoleAppender::stdout(ctx.format),
    )))
}

#[cfg(feature = "file")]
fn build_file(ctx: &ModeContext<'_>) -> Result<BuiltSink> {
    use crate::appenders::{FileRotation, RotatingFileAppender};
    use crate::core::LoggerError;

    let default_name = ctx.logs_dir.join(DEFAULT_LOG_FILE);
    let file_name = ctx
        .section
        .must_string("file_name", &default_name.to_string_lossy());
    let path = Path::new(&file_name);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| {
            ctx.diagnostics.error(
                "Failed to create directory",
                KeyValues::new()
                    .with("dpath", dir.display().to_string())
                    .with("err", e.to_string()),
            );
            LoggerError::create_directory(dir, e)
        })?;
    }

    let appender =
        RotatingFileAppender::new(path, ctx.format, FileRotation::from_section(ctx.section))
            .map_err(|e| {
                ctx.diagnostics.error(
                    "Failed to initialize file handler",
                    KeyValues::new()
                        .with("path", file_name.as_str())
                        .with("err", e.to_string()),
                );
                e
            })?
            .with_diagnostics(Arc::clone(ctx.diagnostics));

    Ok(BuiltSink::closable_reloadable(Arc::new(appender)))
}

#[cfg(not(feature = "file"))]
fn build_file(_ctx: &ModeContext<'_>) -> Result<BuiltSink> {
    Err(crate::core::LoggerError::config(
        "log.file",
        "file mode requires the `file` feature",
    ))
}

fn build_syslog(ctx: &ModeContext<'_>) -> Result<BuiltSink> {
    use crate::appenders::{SyslogAppender, SyslogSettings};

    let settings = SyslogSettings::from_section(ctx.section)?;
    let appender = SyslogAppender::new(settings, ctx.format).map_err(|e| {
        ctx.diagnostics.error(
            "Failed to create syslog handler",
            KeyValues::new().with("err", e.to_string()),
        );
        e
    })?;

    Ok(BuiltSink::closable(Arc::new(appender)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;

    #[test]
    fn test_default_modes() {
        let registry = ModeRegistry::default();
        assert!(registry.contains("console"));
        assert!(registry.contains("syslog"));
        assert_eq!(registry.names(), vec!["console", "file", "syslog"]);
        assert!(!registry.contains("carrier-pigeon"));
    }

    #[test]
    fn test_register_custom_mode() {
        let registry = ModeRegistry::empty().with_mode("memory", |ctx| {
            Ok(BuiltSink::new(Arc::new(MemoryAppender::new(ctx.mode, ctx.format))))
        });

        let section = Section::default();
        let diagnostics = Arc::new(BootstrapLogger::silent());
        let ctx = ModeContext {
            mode: "memory",
            section: &section,
            format: OutputFormat::Json,
            logs_dir: Path::new("."),
            diagnostics: &diagnostics,
        };

        let built = registry.get("memory").map(|build| build(&ctx));
        let built = built.expect("memory mode registered").expect("memory sink built");
        assert_eq!(built.appender.name(), "memory");
        assert!(built.closer.is_none());
        assert!(built.reloader.is_none());
    }

    #[cfg(feature = "file")]
    #[test]
    fn test_file_mode_creates_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let logs_dir = dir.path().join("nested").join("logs");
        let section = Section::default();
        let diagnostics = Arc::new(BootstrapLogger::silent());
        let ctx = ModeContext {
            mode: "file",
            section: &section,
            format: OutputFormat::Text,
            logs_dir: &logs_dir,
            diagnostics: &diagnostics,
        };

        let built = build_file(&ctx)?;
        assert!(logs_dir.join(DEFAULT_LOG_FILE).exists());
        assert!(built.closer.is_some());
        assert!(built.reloader.is_some());
        Ok(())
    }

    #[cfg(all(feature = "file", unix))]
    #[test]
    fn test_file_mode_reports_directory_failure() -> Result<()> {
        use crate::core::LoggerError;

        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "plain file")?;

        let section = crate::core::LogConfig::new()
            .set("log.file", "file_name", blocker.join("app.log").display())
            .section("log.file")
            .cloned()
            .unwrap_or_default();
        let diagnostics = Arc::new(BootstrapLogger::silent());
        let ctx = ModeContext {
            mode: "file",
            section: &section,
            format: OutputFormat::Text,
            logs_dir: dir.path(),
            diagnostics: &diagnostics,
        };

        let err = build_file(&ctx).err().expect("directory creation must fail");
        assert!(matches!(err, LoggerError::CreateDirectory { ref path, .. } if path == &blocker));
        assert_eq!(diagnostics.emitted(), 1);
        Ok(())
    }

    #[cfg(not(feature = "file"))]
    #[test]
    fn test_file_mode_without_feature_fails_load() {
        use crate::core::{LogConfig, LoggerError, LoggingSystem};

        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent());
        let config = LogConfig::new()
            .with_section("log.console")
            .with_section("log.file");

        let err = system.load(&["console", "file"], ".", &config).unwrap_err();
        match err {
            LoggerError::SinkConstruction { mode, source } => {
                assert_eq!(mode, "file");
                assert!(matches!(*source, LoggerError::InvalidConfiguration { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(system.sink_count(), 0);
    }
}
