//! Output format configuration for log entries
//!
//! Provides the output formats a sink can be configured with:
//! - Console: logfmt, colorized by level when the destination is a terminal
//! - Text: plain logfmt key=value pairs (also the fallback)
//! - Json: one JSON object per line

use super::log_context::FieldValue;
use super::log_entry::LogEntry;

/// Output format selected by a sink's `format` key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colorized text on an interactive terminal, plain text otherwise
    Console,

    /// Plain logfmt text (default)
    ///
    /// Example: `level=info msg="Request processed" logger=http status=200`
    #[default]
    Text,

    /// Line-delimited JSON
    ///
    /// Example: `{"level":"info","msg":"Request processed","logger":"http","status":200}`
    Json,
}

impl OutputFormat {
    /// Parse a configured format name; anything unrecognized selects `Text`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "console" => OutputFormat::Console,
            "text" => OutputFormat::Text,
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }

    /// Resolve this format against a destination.
    ///
    /// `to_terminal` says whether the destination is an interactive terminal;
    /// only `Console` looks at it.
    pub fn formatter(&self, to_terminal: bool) -> Formatter {
        match self {
            OutputFormat::Console if to_terminal && cfg!(feature = "console") => {
                Formatter::ColoredLogfmt
            }
            OutputFormat::Console | OutputFormat::Text => Formatter::Logfmt,
            OutputFormat::Json => Formatter::Json,
        }
    }
}

/// A format bound to its destination; turns entries into single lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    Logfmt,
    ColoredLogfmt,
    Json,
}

impl Formatter {
    /// Format an entry as one line, without the trailing newline.
    pub fn format(&self, entry: &LogEntry) -> String {
        match self {
            Formatter::Logfmt => format_logfmt(entry),
            Formatter::ColoredLogfmt => colorize(entry, format_logfmt(entry)),
            Formatter::Json => format_json(entry),
        }
    }
}

fn format_logfmt(entry: &LogEntry) -> String {
    let mut parts = Vec::with_capacity(entry.fields.len() + 2);

    parts.push(format!("level={}", entry.level.to_str()));
    parts.push(format!("msg={}", escape_logfmt_value(&entry.message)));

    for (key, value) in entry.fields.iter() {
        let formatted_value = match value {
            FieldValue::String(s) => escape_logfmt_value(s),
            other => other.to_string(),
        };
        parts.push(format!("{}={}", escape_logfmt_key(key), formatted_value));
    }

    parts.join(" ")
}

fn format_json(entry: &LogEntry) -> String {
    match serde_json::to_string(entry) {
        Ok(line) => line,
        Err(e) => format!(
            r#"{{"level":"error","msg":"failed to encode log entry","err":{}}}"#,
            serde_json::Value::String(e.to_string())
        ),
    }
}

#[cfg(feature = "console")]
fn colorize(entry: &LogEntry, line: String) -> String {
    use colored::Colorize;

    let colored_line = match entry.level.colors() {
        (Some(fg), Some(bg)) => line.color(fg).on_color(bg),
        (Some(fg), None) => line.color(fg),
        (None, Some(bg)) => line.on_color(bg),
        (None, None) => return line,
    };
    colored_line.to_string()
}

#[cfg(not(feature = "console"))]
fn colorize(_entry: &LogEntry, line: String) -> String {
    line
}

/// Escape a logfmt key (remove spaces and special chars)
fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '=' && *c != '"')
        .collect()
}

/// Escape a logfmt value (quote if it is empty or contains spaces, quotes or '=')
fn escape_logfmt_value(value: &str) -> String {
    if value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control())
    {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&c.escape_unicode().to_string()),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
