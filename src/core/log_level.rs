//! Log level definitions and the minimum-level policy applied by sinks

use super::bootstrap::BootstrapLogger;
use super::log_context::KeyValues;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
    Critical = 5,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    /// The minimum-level policy this severity selects when used as a threshold.
    ///
    /// `trace` collapses onto `debug` and `critical` onto `error`.
    #[must_use]
    pub fn filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace | LogLevel::Debug => LevelFilter::AllowDebug,
            LogLevel::Info => LevelFilter::AllowInfo,
            LogLevel::Warn => LevelFilter::AllowWarn,
            LogLevel::Error | LogLevel::Critical => LevelFilter::AllowError,
        }
    }

    #[cfg(feature = "console")]
    pub fn colors(&self) -> (Option<colored::Color>, Option<colored::Color>) {
        use colored::Color::*;
        match self {
            LogLevel::Trace | LogLevel::Debug => (Some(BrightBlack), None),
            LogLevel::Info => (Some(White), None),
            LogLevel::Warn => (Some(Yellow), None),
            LogLevel::Error => (Some(Red), None),
            LogLevel::Critical => (Some(White), Some(Red)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Minimum severity an event needs to pass a sink.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LevelFilter {
    AllowDebug,
    #[default]
    AllowInfo,
    AllowWarn,
    AllowError,
}

impl LevelFilter {
    /// True iff `level` is at or above this minimum.
    #[inline]
    #[must_use]
    pub fn allows(&self, level: LogLevel) -> bool {
        level.filter() >= *self
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LevelFilter::AllowDebug => "debug",
            LevelFilter::AllowInfo => "info",
            LevelFilter::AllowWarn => "warn",
            LevelFilter::AllowError => "error",
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Whether an event of severity `event` reaches a sink whose minimum is `minimum`.
#[inline]
#[must_use]
pub fn compare(event: LogLevel, minimum: LevelFilter) -> bool {
    minimum.allows(event)
}

/// Resolve a configured level name into a filter policy.
///
/// Names are matched case-insensitively. An unknown name is reported once on
/// the bootstrap logger and resolves to error-only filtering.
pub fn resolve(name: &str, diagnostics: &BootstrapLogger) -> LevelFilter {
    match name.trim().parse::<LogLevel>() {
        Ok(level) => level.filter(),
        Err(_) => {
            diagnostics.error(
                "Unknown log level",
                KeyValues::new().with("value", name.to_lowercase()),
            );
            LevelFilter::AllowError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryWriter;

    #[test]
    fn test_equivalent_levels_share_a_policy() {
        assert_eq!(LogLevel::Trace.filter(), LogLevel::Debug.filter());
        assert_eq!(LogLevel::Critical.filter(), LogLevel::Error.filter());
        assert_ne!(LogLevel::Info.filter(), LogLevel::Warn.filter());
    }

    #[test]
    fn test_compare() {
        assert!(compare(LogLevel::Warn, LevelFilter::AllowInfo));
        assert!(compare(LogLevel::Info, LevelFilter::AllowInfo));
        assert!(!compare(LogLevel::Debug, LevelFilter::AllowInfo));
        assert!(compare(LogLevel::Trace, LevelFilter::AllowDebug));
        assert!(compare(LogLevel::Critical, LevelFilter::AllowError));
        assert!(!compare(LogLevel::Warn, LevelFilter::AllowError));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let diag = BootstrapLogger::silent();
        assert_eq!(resolve("DEBUG", &diag), LevelFilter::AllowDebug);
        assert_eq!(resolve("Warn", &diag), LevelFilter::AllowWarn);
        assert_eq!(resolve("critical", &diag), LevelFilter::AllowError);
        assert_eq!(diag.emitted(), 0);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_error() {
        let writer = MemoryWriter::new();
        let diag = BootstrapLogger::with_writer(writer.clone());

        assert_eq!(resolve("Verbose", &diag), LevelFilter::AllowError);
        assert_eq!(diag.emitted(), 1);

        let output = writer.contents();
        assert!(output.contains("level=error"));
        assert!(output.contains("msg=\"Unknown log level\""));
        assert!(output.contains("value=verbose"));
        assert_eq!(output.matches("level=").count(), 1);
    }

    #[test]
    fn test_level_parse_rejects_aliases() {
        assert!("warning".parse::<LogLevel>().is_err());
        assert_eq!("CRITICAL".parse::<LogLevel>(), Ok(LogLevel::Critical));
    }
}
