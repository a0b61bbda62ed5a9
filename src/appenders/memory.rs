//! In-memory capture of formatted log lines

use crate::core::{Appender, Formatter, LogEntry, OutputFormat, Result};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// A cloneable, thread-safe byte buffer implementing `Write`.
///
/// All clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Appender keeping every formatted line in a [`MemoryWriter`]
pub struct MemoryAppender {
    name: String,
    formatter: Formatter,
    writer: MemoryWriter,
}

impl MemoryAppender {
    pub fn new(name: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            name: name.into(),
            formatter: format.formatter(false),
            writer: MemoryWriter::new(),
        }
    }

    /// A handle to the captured output
    pub fn writer(&self) -> MemoryWriter {
        self.writer.clone()
    }
}

impl Appender for MemoryAppender {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let mut line = self.formatter.format(entry);
        line.push('\n');
        self.writer.buffer.lock().extend_from_slice(line.as_bytes());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
