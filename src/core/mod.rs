//! Core types: levels, events, configuration, loggers and the logging system

pub mod appender;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod filter;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod modes;
pub mod output_format;
pub mod stack;
pub mod system;

pub use appender::{Appender, Closable, Reloadable};
pub use bootstrap::BootstrapLogger;
pub use config::{split_list, LogConfig, Section, ROOT_SECTION};
pub use error::{LoggerError, Result};
pub use filter::FilterRules;
pub use log_context::{FieldValue, KeyValues};
pub use log_entry::LogEntry;
pub use log_level::{compare, resolve, LevelFilter, LogLevel};
pub use logger::{NamedLogger, SinkHandle};
pub use modes::{BuiltSink, ModeConstructor, ModeContext, ModeRegistry, DEFAULT_LOG_FILE};
pub use output_format::{Formatter, OutputFormat};
pub use stack::stack;
pub use system::{LoggingSystem, Registry, RegistryBuilder};
