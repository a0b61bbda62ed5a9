//! Error types for the logging pipeline

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A mode was enabled but its `log.<mode>` section is absent
    #[error("failed to get config section {section}")]
    MissingSection { section: String },

    /// The parent directory of a log file could not be created
    #[error("failed to create log directory {path:?}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file handler could not be initialized
    #[error("failed to initialize file handler for '{path}': {message}")]
    FileHandlerInit {
        path: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The syslog connection could not be established
    #[error("failed to create syslog handler for '{address}': {message}")]
    SyslogInit { address: String, message: String },

    /// A mode's sink could not be constructed; aborts the load
    #[error("failed to initialize log mode '{mode}': {source}")]
    SinkConstruction {
        mode: String,
        #[source]
        source: Box<LoggerError>,
    },

    /// File rotation error
    #[error("file rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// A write, reload or close was attempted on a closed sink
    #[error("sink '{sink}' is closed")]
    Closed { sink: String },

    /// IO error with context
    #[error("IO error while {operation}: {source}")]
    IoOperation {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn missing_section(section: impl Into<String>) -> Self {
        LoggerError::MissingSection {
            section: section.into(),
        }
    }

    pub fn create_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoggerError::CreateDirectory {
            path: path.into(),
            source,
        }
    }

    pub fn file_handler(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileHandlerInit {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn file_handler_io(
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::FileHandlerInit {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn syslog(address: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SyslogInit {
            address: address.into(),
            message: message.into(),
        }
    }

    pub fn sink_construction(mode: impl Into<String>, source: LoggerError) -> Self {
        LoggerError::SinkConstruction {
            mode: mode.into(),
            source: Box::new(source),
        }
    }

    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn closed(sink: impl Into<String>) -> Self {
        LoggerError::Closed { sink: sink.into() }
    }

    pub fn io_operation(operation: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
