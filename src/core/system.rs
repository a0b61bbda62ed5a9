//! The logging system: registry of live sinks plus load, close and reload
//!
//! A [`LoggingSystem`] owns the current [`Registry`] behind a read/write lock.
//! Loading builds a complete registry and swaps it in with one write, so a
//! logger being created never sees a half-built sink list. Loggers hold their
//! own snapshot and keep it until they are dropped.

use super::{
    appender::{Closable, Reloadable},
    bootstrap::BootstrapLogger,
    config::{split_list, LogConfig, ROOT_SECTION},
    error::{LoggerError, Result},
    filter::FilterRules,
    log_context::KeyValues,
    log_level::{resolve, LevelFilter},
    logger::{NamedLogger, SinkHandle},
    modes::{BuiltSink, ModeContext, ModeRegistry},
    output_format::OutputFormat,
};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;

/// The sinks installed by one successful load
pub struct Registry {
    sinks: Vec<SinkHandle>,
    closers: Mutex<Vec<Arc<dyn Closable>>>,
    reloaders: Vec<Arc<dyn Reloadable>>,
    filters: FilterRules,
}

impl Registry {
    /// A registry without sinks
    pub fn empty() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Sinks in mode order
    pub fn sinks(&self) -> &[SinkHandle] {
        &self.sinks
    }

    /// Per-name rules of all modes; the first mode to name a logger wins
    pub fn filters(&self) -> &FilterRules {
        &self.filters
    }

    pub fn closable_count(&self) -> usize {
        self.closers.lock().len()
    }

    pub fn reloadable_count(&self) -> usize {
        self.reloaders.len()
    }

    /// Close every closable sink.
    ///
    /// All sinks are attempted; the first error is returned. The closable
    /// list is emptied either way, so calling this again does nothing.
    pub fn close(&self) -> Result<()> {
        let closers = std::mem::take(&mut *self.closers.lock());
        close_all(closers)
    }

    /// Reload every reloadable sink in registration order, stopping at the
    /// first failure.
    pub fn reload(&self) -> Result<()> {
        for reloader in &self.reloaders {
            reloader.reload()?;
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sinks", &self.sinks)
            .field("closers", &self.closable_count())
            .field("reloaders", &self.reloaders.len())
            .field("filters", &self.filters)
            .finish()
    }
}

fn close_all(closers: Vec<Arc<dyn Closable>>) -> Result<()> {
    let mut first_error = None;
    for closer in closers {
        if let Err(e) = closer.close() {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Accumulates sinks for a [`Registry`]
#[derive(Default)]
pub struct RegistryBuilder {
    sinks: Vec<SinkHandle>,
    closers: Vec<Arc<dyn Closable>>,
    reloaders: Vec<Arc<dyn Reloadable>>,
    filters: FilterRules,
}

impl RegistryBuilder {
    /// Append a constructed sink with its level and (already merged) rules
    pub fn add(
        &mut self,
        mode: &str,
        built: BuiltSink,
        max_level: LevelFilter,
        filters: FilterRules,
    ) -> &mut Self {
        self.filters.merge_missing(&filters);
        self.sinks
            .push(SinkHandle::new(mode, built.appender, max_level, filters));
        if let Some(closer) = built.closer {
            self.closers.push(closer);
        }
        if let Some(reloader) = built.reloader {
            self.reloaders.push(reloader);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn build(self) -> Registry {
        Registry {
            sinks: self.sinks,
            closers: Mutex::new(self.closers),
            reloaders: self.reloaders,
            filters: self.filters,
        }
    }

    /// Close what was built so far; used when a load fails partway
    pub fn abandon(self) -> Result<()> {
        close_all(self.closers)
    }
}

/// Process-wide logging state, owned by the host
///
/// # Example
///
/// ```no_run
/// use rust_log_pipeline::{KeyValues, LogConfig, LoggingSystem};
///
/// let config = LogConfig::new()
///     .set("log", "mode", "console file")
///     .set("log", "level", "info")
///     .set("log.file", "level", "debug")
///     .with_section("log.console");
///
/// let system = LoggingSystem::new();
/// system.load_from_config("/var/log/myapp", &config)?;
///
/// let logger = system.new_logger("server", KeyValues::new());
/// logger.info("Starting", KeyValues::new().with("version", "1.2.0"));
///
/// system.close()?;
/// # Ok::<(), rust_log_pipeline::LoggerError>(())
/// ```
pub struct LoggingSystem {
    registry: RwLock<Arc<Registry>>,
    modes: ModeRegistry,
    diagnostics: Arc<BootstrapLogger>,
    load_lock: Mutex<()>,
}

impl LoggingSystem {
    /// Default modes, diagnostics on stderr and no sinks until a load
    pub fn new() -> Self {
        Self::with_bootstrap(BootstrapLogger::stderr())
    }

    pub fn with_bootstrap(diagnostics: BootstrapLogger) -> Self {
        Self {
            registry: RwLock::new(Arc::new(Registry::empty())),
            modes: ModeRegistry::with_defaults(),
            diagnostics: Arc::new(diagnostics),
            load_lock: Mutex::new(()),
        }
    }

    /// Replace the mode constructors used by later loads
    #[must_use]
    pub fn with_modes(mut self, modes: ModeRegistry) -> Self {
        self.modes = modes;
        self
    }

    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    pub fn diagnostics(&self) -> &Arc<BootstrapLogger> {
        &self.diagnostics
    }

    /// The currently installed registry
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry.read())
    }

    fn install(&self, registry: Registry) -> Arc<Registry> {
        std::mem::replace(&mut *self.registry.write(), Arc::new(registry))
    }

    /// Close the current sinks and build one sink per enabled mode.
    ///
    /// On success the registry holds exactly the enabled modes, in order.
    /// On failure the sinks built so far are closed again and the registry
    /// is left empty.
    pub fn load<S: AsRef<str>>(
        &self,
        modes: &[S],
        logs_dir: impl AsRef<Path>,
        config: &LogConfig,
    ) -> Result<()> {
        let _loading = self.load_lock.lock();
        let diag = &self.diagnostics;
        let logs_dir = logs_dir.as_ref();

        let previous = self.install(Registry::empty());
        if let Err(e) = previous.close() {
            diag.error(
                "Failed to close log handlers",
                KeyValues::new().with("err", e.to_string()),
            );
        }

        let root = config.root();
        let default_level_name = root.must_string("level", "info").to_lowercase();
        resolve(&default_level_name, diag);
        let default_filters = FilterRules::parse(root.string("filters"), diag);

        let mut builder = Registry::builder();
        for mode in modes {
            let mode = mode.as_ref().trim();
            if mode.is_empty() {
                continue;
            }

            let section_name = format!("{ROOT_SECTION}.{mode}");
            let Some(section) = config.section(&section_name) else {
                diag.error("Unknown log mode", KeyValues::new().with("mode", mode));
                self.abandon(builder);
                return Err(LoggerError::missing_section(section_name));
            };

            let max_level = resolve(&section.must_string("level", &default_level_name), diag);
            let mut filters = FilterRules::parse(section.string("filters"), diag);
            let format = OutputFormat::from_name(section.string("format"));

            let Some(construct) = self.modes.get(mode) else {
                diag.warn("Unknown log mode", KeyValues::new().with("mode", mode));
                continue;
            };

            let ctx = ModeContext {
                mode,
                section,
                format,
                logs_dir,
                diagnostics: diag,
            };
            let built = match construct(&ctx) {
                Ok(built) => built,
                Err(e) => {
                    self.abandon(builder);
                    return Err(LoggerError::sink_construction(mode, e));
                }
            };

            filters.merge_missing(&default_filters);
            builder.add(mode, built, max_level, filters);
        }

        self.install(builder.build());
        Ok(())
    }

    fn abandon(&self, builder: RegistryBuilder) {
        if let Err(e) = builder.abandon() {
            self.diagnostics.error(
                "Failed to close log handlers",
                KeyValues::new().with("err", e.to_string()),
            );
        }
    }

    /// Load with a comma/space separated mode list such as `"console file"`
    pub fn load_modes_str(
        &self,
        modes: &str,
        logs_dir: impl AsRef<Path>,
        config: &LogConfig,
    ) -> Result<()> {
        self.load(&split_list(modes), logs_dir, config)
    }

    /// Load the modes listed under `log.mode` (`console` when unset)
    pub fn load_from_config(&self, logs_dir: impl AsRef<Path>, config: &LogConfig) -> Result<()> {
        self.load(&config.modes(), logs_dir, config)
    }

    /// A logger bound to the sinks installed right now
    pub fn new_logger(&self, name: &str, context: KeyValues) -> NamedLogger {
        let registry = self.registry();
        NamedLogger::bind(name, context, registry.sinks(), Arc::clone(&self.diagnostics))
    }

    /// A logger without a name, at each sink's maximum level
    pub fn root(&self) -> NamedLogger {
        self.new_logger("", KeyValues::new())
    }

    /// Best-effort close of every closable sink; see [`Registry::close`]
    pub fn close(&self) -> Result<()> {
        self.registry().close()
    }

    /// Fail-fast reload of every reloadable sink; see [`Registry::reload`]
    pub fn reload(&self) -> Result<()> {
        let _loading = self.load_lock.lock();
        self.registry().reload()
    }

    /// Snapshot of the merged per-name rules
    pub fn filters(&self) -> FilterRules {
        self.registry().filters().clone()
    }

    pub fn sinks(&self) -> Vec<SinkHandle> {
        self.registry().sinks().to_vec()
    }

    pub fn sink_count(&self) -> usize {
        self.registry().sinks().len()
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoggingSystem {
    fn drop(&mut self) {
        if let Err(e) = self.registry().close() {
            self.diagnostics.error(
                "Failed to close log handlers",
                KeyValues::new().with("err", e.to_string()),
            );
        }
    }
}

impl std::fmt::Debug for LoggingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingSystem")
            .field("registry", &self.registry())
            .field("modes", &self.modes.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, MemoryWriter};
    use crate::core::{Appender, LogEntry};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records close/reload calls and fails on demand
    struct Probe {
        name: String,
        fail: bool,
        closes: AtomicUsize,
        reloads: AtomicUsize,
    }

    impl Probe {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail,
                closes: AtomicUsize::new(0),
                reloads: AtomicUsize::new(0),
            })
        }
    }

    impl Appender for Probe {
        fn append(&self, _entry: &LogEntry) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Closable for Probe {
        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LoggerError::other(format!("close {}", self.name)));
            }
            Ok(())
        }
    }

    impl Reloadable for Probe {
        fn reload(&self) -> Result<()> {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LoggerError::other(format!("reload {}", self.name)));
            }
            Ok(())
        }
    }

    fn probe_registry(probes: &[Arc<Probe>]) -> Registry {
        let mut builder = Registry::builder();
        for probe in probes {
            builder.add(
                &probe.name,
                BuiltSink::closable_reloadable(Arc::clone(probe)),
                LevelFilter::AllowInfo,
                FilterRules::new(),
            );
        }
        builder.build()
    }

    /// Modes backed by memory appenders, with their writers by mode name
    fn memory_modes() -> (ModeRegistry, Arc<Mutex<HashMap<String, MemoryWriter>>>) {
        let writers = Arc::new(Mutex::new(HashMap::new()));
        let mut modes = ModeRegistry::empty();
        for name in ["console", "file", "extra"] {
            let writers = Arc::clone(&writers);
            modes.register(name, move |ctx: &ModeContext<'_>| {
                let appender = MemoryAppender::new(ctx.mode, ctx.format);
                writers.lock().insert(ctx.mode.to_string(), appender.writer());
                Ok(BuiltSink::new(Arc::new(appender)))
            });
        }
        (modes, writers)
    }

    #[test]
    fn test_close_is_best_effort_and_idempotent() {
        let probes = [Probe::new("a", false), Probe::new("b", true), Probe::new("c", false)];
        let registry = probe_registry(&probes);

        let err = registry.close().err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("close b"));
        assert!(probes.iter().all(|p| p.closes.load(Ordering::SeqCst) == 1));
        assert_eq!(registry.closable_count(), 0);

        assert!(registry.close().is_ok());
        assert!(probes.iter().all(|p| p.closes.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn test_close_without_closables() {
        let registry = Registry::empty();
        assert!(registry.close().is_ok());
        assert!(registry.close().is_ok());
    }

    #[test]
    fn test_reload_stops_at_first_failure() {
        let probes = [Probe::new("a", false), Probe::new("b", true), Probe::new("c", false)];
        let registry = probe_registry(&probes);

        let err = registry.reload().err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("reload b"));
        assert_eq!(probes[0].reloads.load(Ordering::SeqCst), 1);
        assert_eq!(probes[1].reloads.load(Ordering::SeqCst), 1);
        assert_eq!(probes[2].reloads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_global_filters_first_writer_wins() {
        let mut builder = Registry::builder();
        builder
            .add(
                "console",
                BuiltSink::new(Arc::new(MemoryAppender::new("console", OutputFormat::Text))),
                LevelFilter::AllowInfo,
                FilterRules::new().with("z", LevelFilter::AllowWarn),
            )
            .add(
                "file",
                BuiltSink::new(Arc::new(MemoryAppender::new("file", OutputFormat::Text))),
                LevelFilter::AllowInfo,
                FilterRules::new().with("z", LevelFilter::AllowDebug),
            );
        let registry = builder.build();

        assert_eq!(registry.filters().get("z"), Some(LevelFilter::AllowWarn));
        assert_eq!(registry.sinks()[1].level_for("z"), LevelFilter::AllowDebug);
    }

    #[test]
    fn test_load_merges_default_and_mode_filters() -> Result<()> {
        let (modes, _writers) = memory_modes();
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent()).with_modes(modes);
        let config = LogConfig::new()
            .set("log", "filters", "x:warn")
            .set("log.console", "filters", "y:error")
            .set("log.file", "filters", "x:error");

        system.load(&["console", "file"], ".", &config)?;

        let sinks = system.sinks();
        assert_eq!(sinks[0].filters().get("x"), Some(LevelFilter::AllowWarn));
        assert_eq!(sinks[0].filters().get("y"), Some(LevelFilter::AllowError));
        assert_eq!(sinks[1].filters().get("x"), Some(LevelFilter::AllowError));
        assert_eq!(system.filters().get("x"), Some(LevelFilter::AllowWarn));
        Ok(())
    }

    #[test]
    fn test_load_levels_per_mode() -> Result<()> {
        let (modes, writers) = memory_modes();
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent()).with_modes(modes);
        let config = LogConfig::new()
            .set("log", "level", "info")
            .set("log.file", "level", "debug")
            .with_section("log.console");

        system.load(&["console", "file"], ".", &config)?;
        let logger = system.new_logger("app", KeyValues::new());
        logger.debug("details", KeyValues::new());
        logger.info("summary", KeyValues::new());

        let writers = writers.lock();
        assert_eq!(writers["console"].lines(), vec!["level=info msg=summary logger=app"]);
        assert_eq!(writers["file"].lines().len(), 2);
        Ok(())
    }

    #[test]
    fn test_missing_section_fails_and_leaves_empty_registry() {
        let (modes, _writers) = memory_modes();
        let diag_out = MemoryWriter::new();
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::with_writer(diag_out.clone()))
            .with_modes(modes);
        let config = LogConfig::new().with_section("log.console");

        let err = system.load(&["console", "file"], ".", &config).err();
        assert!(matches!(err, Some(LoggerError::MissingSection { ref section }) if section == "log.file"));
        assert_eq!(system.sink_count(), 0);
        assert!(diag_out.contents().contains("mode=file"));
    }

    #[test]
    fn test_unknown_mode_is_skipped_with_diagnostic() -> Result<()> {
        let (modes, _writers) = memory_modes();
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent()).with_modes(modes);
        let config = LogConfig::new()
            .with_section("log.console")
            .with_section("log.pigeon");

        system.load(&["console", " pigeon ", ""], ".", &config)?;

        assert_eq!(system.sink_count(), 1);
        assert_eq!(system.diagnostics().emitted(), 1);
        Ok(())
    }

    #[test]
    fn test_construction_failure_closes_partial_sinks() {
        let probe = Probe::new("first", false);
        let built_probe = Arc::clone(&probe);
        let modes = ModeRegistry::empty()
            .with_mode("first", move |_ctx: &ModeContext<'_>| {
                Ok(BuiltSink::closable(Arc::clone(&built_probe)))
            })
            .with_mode("broken", |_ctx: &ModeContext<'_>| {
                Err(LoggerError::file_handler("/nowhere/app.log", "denied"))
            });
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent()).with_modes(modes);
        let config = LogConfig::new().with_section("log.first").with_section("log.broken");

        let err = system.load(&["first", "broken"], ".", &config).err();

        assert!(matches!(err, Some(LoggerError::SinkConstruction { ref mode, .. }) if mode == "broken"));
        assert_eq!(probe.closes.load(Ordering::SeqCst), 1);
        assert_eq!(system.sink_count(), 0);
    }

    #[test]
    fn test_reload_of_system_replaces_registry() -> Result<()> {
        let (modes, _writers) = memory_modes();
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent()).with_modes(modes);
        let config = LogConfig::new()
            .with_section("log.console")
            .with_section("log.extra");

        system.load(&["console", "extra"], ".", &config)?;
        assert_eq!(system.sink_count(), 2);

        system.load(&["console"], ".", &config)?;
        assert_eq!(system.sink_count(), 1);
        assert_eq!(system.sinks()[0].mode(), "console");
        Ok(())
    }

    #[test]
    fn test_loggers_keep_filters_from_creation() -> Result<()> {
        let (modes, writers) = memory_modes();
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent()).with_modes(modes);

        system.load(&["console"], ".", &LogConfig::new().with_section("log.console"))?;
        let stale = system.new_logger("auth", KeyValues::new());

        let strict = LogConfig::new().set("log.console", "filters", "auth:error");
        system.load(&["console"], ".", &strict)?;
        let fresh = system.new_logger("auth", KeyValues::new());

        assert_eq!(stale.levels(), vec![LevelFilter::AllowInfo]);
        assert_eq!(fresh.levels(), vec![LevelFilter::AllowError]);

        fresh.info("hidden", KeyValues::new());
        assert!(writers.lock()["console"].lines().is_empty());
        Ok(())
    }

    #[test]
    fn test_root_logger_has_no_name_field() -> Result<()> {
        let (modes, writers) = memory_modes();
        let system = LoggingSystem::with_bootstrap(BootstrapLogger::silent()).with_modes(modes);
        system.load_modes_str("console", ".", &LogConfig::new().with_section("log.console"))?;

        system.root().info("hello", KeyValues::new());

        assert_eq!(writers.lock()["console"].lines(), vec!["level=info msg=hello"]);
        Ok(())
    }
}
