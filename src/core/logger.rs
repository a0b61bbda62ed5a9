//! Sink handles and named loggers
//!
//! A [`SinkHandle`] is one configured output: an appender plus the maximum
//! level and per-logger-name rules of its mode. A [`NamedLogger`] binds a
//! logger name and constant context to a snapshot of the handles, resolving
//! each handle's minimum level for that name once, at creation.

use super::{
    appender::Appender,
    bootstrap::BootstrapLogger,
    filter::FilterRules,
    log_context::KeyValues,
    log_entry::LogEntry,
    log_level::{LevelFilter, LogLevel},
};
use std::sync::Arc;

/// One configured output
#[derive(Clone)]
pub struct SinkHandle {
    mode: String,
    appender: Arc<dyn Appender>,
    max_level: LevelFilter,
    filters: FilterRules,
}

impl SinkHandle {
    pub fn new(
        mode: impl Into<String>,
        appender: Arc<dyn Appender>,
        max_level: LevelFilter,
        filters: FilterRules,
    ) -> Self {
        Self {
            mode: mode.into(),
            appender,
            max_level,
            filters,
        }
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn appender(&self) -> &Arc<dyn Appender> {
        &self.appender
    }

    pub fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Rules of this mode, defaults included
    pub fn filters(&self) -> &FilterRules {
        &self.filters
    }

    /// Minimum level a logger called `name` gets on this sink
    pub fn level_for(&self, name: &str) -> LevelFilter {
        self.filters.level_for(name, self.max_level)
    }
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle")
            .field("mode", &self.mode)
            .field("appender", &self.appender.name())
            .field("max_level", &self.max_level)
            .field("filters", &self.filters)
            .finish()
    }
}

struct BoundSink {
    appender: Arc<dyn Appender>,
    min_level: LevelFilter,
}

/// A named, reusable entry point for emitting events
///
/// Cheap to clone. Levels are frozen at creation: configuration loaded later
/// does not change where or how this logger writes.
///
/// # Example
///
/// ```
/// use rust_log_pipeline::{KeyValues, LoggingSystem};
///
/// let system = LoggingSystem::new();
/// let logger = system.new_logger("auth", KeyValues::new().with("org", 1));
/// logger.info("User logged in", KeyValues::new().with("user", "alice"));
/// ```
#[derive(Clone)]
pub struct NamedLogger {
    name: String,
    context: KeyValues,
    sinks: Arc<[BoundSink]>,
    diagnostics: Arc<BootstrapLogger>,
}

impl NamedLogger {
    pub(crate) fn bind(
        name: &str,
        context: KeyValues,
        handles: &[SinkHandle],
        diagnostics: Arc<BootstrapLogger>,
    ) -> Self {
        // The root logger carries no `logger` field.
        let mut fields = if name.is_empty() {
            KeyValues::new()
        } else {
            KeyValues::new().with("logger", name)
        };
        fields.extend_from(&context);

        let sinks: Vec<BoundSink> = handles
            .iter()
            .map(|handle| BoundSink {
                appender: Arc::clone(&handle.appender),
                min_level: handle.level_for(name),
            })
            .collect();

        Self {
            name: name.to_string(),
            context: fields,
            sinks: sinks.into(),
            diagnostics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constant fields added to every event, `logger` first (if named)
    pub fn context(&self) -> &KeyValues {
        &self.context
    }

    /// Minimum level per bound sink, in sink order
    pub fn levels(&self) -> Vec<LevelFilter> {
        self.sinks.iter().map(|s| s.min_level).collect()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// A logger with the same sinks and levels and extra constant fields
    #[must_use]
    pub fn with(&self, context: KeyValues) -> Self {
        let mut fields = self.context.clone();
        fields.extend_from(&context);
        Self {
            name: self.name.clone(),
            context: fields,
            sinks: Arc::clone(&self.sinks),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }

    /// Whether at least one sink takes events of `level`
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.sinks.iter().any(|s| s.min_level.allows(level))
    }

    /// Fan an event out to every sink that takes its level.
    ///
    /// Never fails: a sink that cannot write is reported on the bootstrap
    /// logger and the event is dropped for that sink only.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, args: KeyValues) {
        if !self.enabled(level) {
            return;
        }

        let mut fields = self.context.clone();
        fields.extend_from(&args);
        let entry = LogEntry::new(level, message).with_fields(fields);

        for sink in self.sinks.iter() {
            if !sink.min_level.allows(level) {
                continue;
            }
            if let Err(e) = sink.appender.append(&entry) {
                self.diagnostics.error(
                    "Failed to write log event",
                    KeyValues::new()
                        .with("sink", sink.appender.name())
                        .with("logger", self.name.as_str())
                        .with("err", e.to_string()),
                );
            }
        }
    }

    pub fn debug(&self, message: impl AsRef<str>, args: KeyValues) {
        self.log(LogLevel::Debug, message, args);
    }

    pub fn info(&self, message: impl AsRef<str>, args: KeyValues) {
        self.log(LogLevel::Info, message, args);
    }

    pub fn warn(&self, message: impl AsRef<str>, args: KeyValues) {
        self.log(LogLevel::Warn, message, args);
    }

    pub fn error(&self, message: impl AsRef<str>, args: KeyValues) {
        self.log(LogLevel::Error, message, args);
    }

    /// Flush every bound sink, reporting failures on the bootstrap logger
    pub fn flush(&self) {
        for sink in self.sinks.iter() {
            if let Err(e) = sink.appender.flush() {
                self.diagnostics.error(
                    "Failed to flush sink",
                    KeyValues::new()
                        .with("sink", sink.appender.name())
                        .with("err", e.to_string()),
                );
            }
        }
    }
}

impl std::fmt::Debug for NamedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLogger")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("levels", &self.levels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, MemoryWriter};
    use crate::core::{LoggerError, OutputFormat, Result};

    struct FailingAppender;

    impl Appender for FailingAppender {
        fn append(&self, _entry: &LogEntry) -> Result<()> {
            Err(LoggerError::closed("broken"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn memory_handle(mode: &str, max: LevelFilter, filters: FilterRules) -> (SinkHandle, MemoryWriter) {
        let appender = MemoryAppender::new(mode, OutputFormat::Text);
        let writer = appender.writer();
        (SinkHandle::new(mode, Arc::new(appender), max, filters), writer)
    }

    #[test]
    fn test_event_layout() {
        let (handle, out) = memory_handle("memory", LevelFilter::AllowDebug, FilterRules::new());
        let logger = NamedLogger::bind(
            "auth",
            KeyValues::new().with("org", 7),
            &[handle],
            Arc::new(BootstrapLogger::silent()),
        );

        logger.warn("Invalid password", KeyValues::new().with("user", "bob"));

        assert_eq!(
            out.lines(),
            vec![r#"level=warn msg="Invalid password" logger=auth org=7 user=bob"#.to_string()]
        );
    }

    #[test]
    fn test_per_name_rule_overrides_max_level() {
        let filters = FilterRules::new().with("sql", LevelFilter::AllowDebug);
        let (handle, out) = memory_handle("memory", LevelFilter::AllowWarn, filters);
        let handles = [handle];
        let diag = Arc::new(BootstrapLogger::silent());

        let sql = NamedLogger::bind("sql", KeyValues::new(), &handles, Arc::clone(&diag));
        let http = NamedLogger::bind("http", KeyValues::new(), &handles, diag);

        sql.debug("query", KeyValues::new());
        http.info("request", KeyValues::new());
        http.warn("slow request", KeyValues::new());

        assert_eq!(sql.levels(), vec![LevelFilter::AllowDebug]);
        assert_eq!(http.levels(), vec![LevelFilter::AllowWarn]);
        assert_eq!(out.lines().len(), 2);
        assert!(out.contents().contains("msg=query"));
        assert!(!out.contents().contains("msg=request"));
    }

    #[test]
    fn test_fan_out_in_sink_order() {
        let (first, out1) = memory_handle("one", LevelFilter::AllowInfo, FilterRules::new());
        let (second, out2) = memory_handle("two", LevelFilter::AllowError, FilterRules::new());
        let logger = NamedLogger::bind(
            "app",
            KeyValues::new(),
            &[first, second],
            Arc::new(BootstrapLogger::silent()),
        );

        logger.info("started", KeyValues::new());
        logger.error("crashed", KeyValues::new());

        assert_eq!(out1.lines().len(), 2);
        assert_eq!(out2.lines(), vec!["level=error msg=crashed logger=app".to_string()]);
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        let broken = SinkHandle::new(
            "broken",
            Arc::new(FailingAppender),
            LevelFilter::AllowDebug,
            FilterRules::new(),
        );
        let (healthy, out) = memory_handle("memory", LevelFilter::AllowDebug, FilterRules::new());
        let diag_out = MemoryWriter::new();
        let logger = NamedLogger::bind(
            "app",
            KeyValues::new(),
            &[broken, healthy],
            Arc::new(BootstrapLogger::with_writer(diag_out.clone())),
        );

        logger.info("still delivered", KeyValues::new());

        assert_eq!(out.lines().len(), 1);
        assert!(diag_out.contents().contains("sink=broken"));
    }

    #[test]
    fn test_with_adds_context() {
        let (handle, out) = memory_handle("memory", LevelFilter::AllowInfo, FilterRules::new());
        let logger = NamedLogger::bind(
            "http",
            KeyValues::new(),
            &[handle],
            Arc::new(BootstrapLogger::silent()),
        );

        let request_logger = logger.with(KeyValues::new().with("request_id", "r-1"));
        request_logger.info("done", KeyValues::new().with("status", 200));

        assert_eq!(
            out.lines(),
            vec!["level=info msg=done logger=http request_id=r-1 status=200".to_string()]
        );
        assert_eq!(logger.context().len(), 1);
    }

    #[test]
    fn test_no_sinks_is_a_no_op() {
        let logger = NamedLogger::bind("idle", KeyValues::new(), &[], Arc::new(BootstrapLogger::silent()));
        assert!(!logger.enabled(LogLevel::Error));
        logger.error("nobody listens", KeyValues::new());
        assert_eq!(logger.sink_count(), 0);
    }
}
