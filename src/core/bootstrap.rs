//! Diagnostics channel for the pipeline itself
//!
//! Problems found while configuring or driving the sinks (unknown level
//! names, unknown modes, failed writes) cannot go through the sinks they
//! concern, so they are written as logfmt lines to a separate writer,
//! stderr by default.

use super::log_context::KeyValues;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::output_format::Formatter;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct BootstrapLogger {
    writer: Mutex<Box<dyn Write + Send>>,
    emitted: AtomicU64,
}

impl BootstrapLogger {
    /// Diagnostics to the process's standard error
    pub fn stderr() -> Self {
        Self::with_writer(std::io::stderr())
    }

    /// Diagnostics are counted but discarded
    pub fn silent() -> Self {
        Self::with_writer(std::io::sink())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            emitted: AtomicU64::new(0),
        }
    }

    pub fn log(&self, level: LogLevel, message: &str, fields: KeyValues) {
        self.emitted.fetch_add(1, Ordering::Relaxed);

        let entry = LogEntry::new(level, message).with_fields(fields);
        let mut line = Formatter::Logfmt.format(&entry);
        line.push('\n');

        let mut writer = self.writer.lock();
        // Nowhere left to report a failure of the diagnostics writer.
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    pub fn error(&self, message: &str, fields: KeyValues) {
        self.log(LogLevel::Error, message, fields);
    }

    pub fn warn(&self, message: &str, fields: KeyValues) {
        self.log(LogLevel::Warn, message, fields);
    }

    /// Number of diagnostics written so far
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl Default for BootstrapLogger {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for BootstrapLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapLogger")
            .field("emitted", &self.emitted())
            .finish_non_exhaustive()
    }
}
