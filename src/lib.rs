//! # Rust Log Pipeline
//!
//! A multi-sink structured logging pipeline. Events from named loggers are
//! fanned out to every configured sink (console, rotating file, syslog, or
//! host-registered modes), each with its own format, maximum level and
//! per-logger-name overrides.
//!
//! ## Features
//!
//! - **Configuration-driven**: one sink per enabled mode, read from `log` and
//!   `log.<mode>` sections
//! - **Per-name filters**: silence a noisy component everywhere while raising
//!   its verbosity on a single sink
//! - **Lifecycle**: best-effort close and fail-fast reload of open sinks
//! - **Thread safe**: loggers are cheap to clone and share across threads
//!
//! ## Quick start
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//!
//! let config = LogConfig::new()
//!     .set("log", "level", "info")
//!     .set("log.console", "format", "text")
//!     .set("log.console", "filters", "sql:debug");
//!
//! let system = LoggingSystem::new();
//! system.load(&["console"], "/tmp", &config)?;
//!
//! let logger = system.new_logger("sql", KeyValues::new().with("db", "main"));
//! logger.debug("Executing query", KeyValues::new().with("table", "users"));
//! # Ok::<(), LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, MemoryAppender, SyslogAppender};
    #[cfg(feature = "file")]
    pub use crate::appenders::{FileRotation, RotatingFileAppender};
    pub use crate::core::{
        Appender, BootstrapLogger, BuiltSink, Closable, FieldValue, FilterRules, KeyValues,
        LevelFilter, LogConfig, LogEntry, LogLevel, LoggerError, LoggingSystem, ModeContext,
        ModeRegistry, NamedLogger, OutputFormat, Reloadable, Result, SinkHandle,
    };
}

pub use appenders::{ConsoleAppender, MemoryAppender, SyslogAppender};
#[cfg(feature = "file")]
pub use appenders::{FileRotation, RotatingFileAppender};
pub use core::{
    stack, Appender, BootstrapLogger, BuiltSink, Closable, FieldValue, FilterRules, Formatter,
    KeyValues, LevelFilter, LogConfig, LogEntry, LogLevel, LoggerError, LoggingSystem,
    ModeContext, ModeRegistry, NamedLogger, OutputFormat, Registry, Reloadable, Result, Section,
    SinkHandle,
};
