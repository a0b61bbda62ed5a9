//! Log entry structure

use super::log_context::KeyValues;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One structured event on its way to a sink.
///
/// `fields` holds everything after `level` and `msg`: the logger name, the
/// logger's constant context and the call arguments, in that order.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub fields: KeyValues,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            fields: KeyValues::new(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: KeyValues) -> Self {
        self.fields = fields;
        self
    }

    /// The `logger` field, if the entry was emitted through a named logger
    pub fn logger(&self) -> Option<String> {
        self.fields.get("logger").map(ToString::to_string)
    }
}

impl Serialize for LogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry("level", self.level.to_str())?;
        map.serialize_entry("msg", &self.message)?;
        for (key, value) in self.fields.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
