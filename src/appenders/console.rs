//! Console appender implementation

use crate::core::{Appender, Formatter, LogEntry, OutputFormat, Result};
use parking_lot::Mutex;
use std::io::{IsTerminal, Write};

/// Writes one line per event to standard output (or an injected writer).
///
/// Console output has neither close nor reload capability.
pub struct ConsoleAppender {
    formatter: Formatter,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleAppender {
    /// Standard output; `Console` format colorizes only on a terminal.
    pub fn stdout(format: OutputFormat) -> Self {
        let stdout = std::io::stdout();
        let to_terminal = stdout.is_terminal();
        Self {
            formatter: format.formatter(to_terminal),
            writer: Mutex::new(Box::new(stdout)),
        }
    }

    /// Any writer, treated as a non-terminal destination
    pub fn with_writer<W: Write + Send + 'static>(format: OutputFormat, writer: W) -> Self {
        Self {
            formatter: format.formatter(false),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn formatter(&self) -> Formatter {
        self.formatter
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::stdout(OutputFormat::Console)
    }
}

impl Appender for ConsoleAppender {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let mut output = self.formatter.format(entry);
        output.push('\n');

        let mut writer = self.writer.lock();
        writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
