//! Logging macros for named loggers.
//!
//! A message may be a format string with arguments, or a plain message
//! followed by `;` and `key => value` pairs that become event fields.
//!
//! # Examples
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//! use rust_log_pipeline::info;
//!
//! let system = LoggingSystem::new();
//! let logger = system.new_logger("server", KeyValues::new());
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! info!(logger, "Request served"; "path" => "/api/health", "status" => 200);
//! ```

/// Log at an explicit level.
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = LoggingSystem::new().new_logger("db", KeyValues::new());
/// use rust_log_pipeline::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// log!(logger, LogLevel::Warn, "Slow query"; "ms" => 1200);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr; $($key:expr => $value:expr),+ $(,)?) => {
        $logger.log(
            $level,
            $msg,
            $crate::KeyValues::new()$(.with($key, $value))+,
        )
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), $crate::KeyValues::new())
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = LoggingSystem::new().new_logger("db", KeyValues::new());
/// use rust_log_pipeline::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Query failed"; "err" => "timeout", "attempt" => 3);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
