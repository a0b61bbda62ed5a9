//! Rotating file appender
//!
//! Writes formatted lines to a single file and rolls it over when it reaches
//! a line count, a byte size, or a new calendar day. Rolled files are renamed
//! to `<file>.<YYYY-MM-DD>.<NNN>` and removed once older than `max_days`.
//! The appender can be reloaded (the file is reopened at the same path, for
//! external log rotation) and closed.

use crate::core::{
    Appender, BootstrapLogger, Closable, Formatter, KeyValues, LogEntry, LoggerError,
    OutputFormat, Reloadable, Result, Section,
};
use chrono::{Local, NaiveDate};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Highest suffix tried when looking for a free rotated file name
const MAX_ROTATED_PER_DAY: u32 = 999;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Rollover settings of a file sink
///
/// # Examples
///
/// ```
/// use rust_log_pipeline::appenders::FileRotation;
///
/// let rotation = FileRotation::new()
///     .with_max_lines(10_000)
///     .with_max_size_shift(20)
///     .with_max_days(3);
/// assert_eq!(rotation.max_size, 1 << 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRotation {
    /// Master switch; nothing below applies when false
    pub rotate: bool,
    /// Roll over after this many lines (0 disables)
    pub max_lines: u64,
    /// Roll over once the file holds this many bytes (0 disables)
    pub max_size: u64,
    /// Roll over when the calendar day changes
    pub daily: bool,
    /// Rotated files older than this many days are deleted
    pub max_days: i64,
}

impl Default for FileRotation {
    fn default() -> Self {
        Self {
            rotate: true,
            max_lines: 1_000_000,
            max_size: 1 << 28,
            daily: true,
            max_days: 7,
        }
    }
}

impl FileRotation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `log_rotate`, `max_lines`, `max_size_shift`, `daily_rotate` and
    /// `max_days` from a mode section.
    pub fn from_section(section: &Section) -> Self {
        let defaults = Self::default();
        let shift = section.must_u32("max_size_shift", 28);
        Self {
            rotate: section.must_bool("log_rotate", defaults.rotate),
            max_lines: section
                .must_int("max_lines", defaults.max_lines as i64)
                .max(0) as u64,
            max_size: 1u64.checked_shl(shift).unwrap_or(defaults.max_size),
            daily: section.must_bool("daily_rotate", defaults.daily),
            max_days: section.must_int("max_days", defaults.max_days),
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_lines(mut self, max_lines: u64) -> Self {
        self.max_lines = max_lines;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the size limit as a power of two
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_shift(mut self, shift: u32) -> Self {
        self.max_size = 1u64.checked_shl(shift).unwrap_or(self.max_size);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_daily(mut self, daily: bool) -> Self {
        self.daily = daily;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_days(mut self, max_days: i64) -> Self {
        self.max_days = max_days;
        self
    }
}

struct FileState {
    writer: Option<LineWriter<File>>,
    lines: u64,
    size: u64,
    opened_day: NaiveDate,
    closed: bool,
}

/// File appender with line/size/daily rollover
///
/// # Examples
///
/// ```no_run
/// use rust_log_pipeline::appenders::{FileRotation, RotatingFileAppender};
/// use rust_log_pipeline::OutputFormat;
///
/// let appender = RotatingFileAppender::new(
///     "/var/log/app/app.log",
///     OutputFormat::Text,
///     FileRotation::new().with_max_days(14),
/// )
/// .unwrap();
/// ```
pub struct RotatingFileAppender {
    path: PathBuf,
    formatter: Formatter,
    rotation: FileRotation,
    state: Mutex<FileState>,
    diagnostics: Arc<BootstrapLogger>,
}

impl RotatingFileAppender {
    /// Open (or create) the file and pick up its current size and line count.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or inspected
    pub fn new<P: AsRef<Path>>(path: P, format: OutputFormat, rotation: FileRotation) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = Self::open_state(&path, &rotation)?;

        Ok(Self {
            path,
            formatter: format.formatter(false),
            rotation,
            state: Mutex::new(state),
            diagnostics: Arc::new(BootstrapLogger::stderr()),
        })
    }

    /// Where rotation problems are reported
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<BootstrapLogger>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    fn open_state(path: &Path, rotation: &FileRotation) -> Result<FileState> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_handler_io(path.display().to_string(), "failed to open", e)
            })?;

        let metadata = file.metadata().map_err(|e| {
            LoggerError::file_handler_io(
                path.display().to_string(),
                "cannot access file metadata",
                e,
            )
        })?;

        let lines = if rotation.rotate && rotation.max_lines > 0 && metadata.len() > 0 {
            count_lines(path)?
        } else {
            0
        };

        let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
        let opened_day = chrono::DateTime::<Local>::from(modified).date_naive();

        Ok(FileState {
            writer: Some(LineWriter::new(file)),
            lines,
            size: metadata.len(),
            opened_day,
            closed: false,
        })
    }

    fn should_rotate(&self, state: &FileState) -> bool {
        if !self.rotation.rotate {
            return false;
        }
        (self.rotation.max_lines > 0 && state.lines >= self.rotation.max_lines)
            || (self.rotation.max_size > 0 && state.size >= self.rotation.max_size)
            || (self.rotation.daily && Local::now().date_naive() != state.opened_day)
    }

    /// Rename the current file aside, start a fresh one, prune old files.
    fn rotate(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("failed to flush before rotation: {}", e),
                )
            })?;
            // Serializes rollover with other processes sharing the file.
            let file = writer.get_ref();
            file.lock_exclusive()?;
            let renamed = self.rename_current(state.opened_day);
            let _ = FileExt::unlock(file);
            renamed?;
        }

        let fresh = Self::open_state(&self.path, &self.rotation)?;
        state.writer = fresh.writer;
        state.lines = 0;
        state.size = 0;
        state.opened_day = Local::now().date_naive();

        self.delete_old();
        Ok(())
    }

    fn rename_current(&self, day: NaiveDate) -> Result<PathBuf> {
        let stamp = day.format("%Y-%m-%d");
        for num in 1..=MAX_ROTATED_PER_DAY {
            let target = sibling(&self.path, &format!("{}.{:03}", stamp, num));
            if !target.exists() {
                fs::rename(&self.path, &target).map_err(|e| {
                    LoggerError::file_rotation(
                        self.path.display().to_string(),
                        format!("failed to rename to {}: {}", target.display(), e),
                    )
                })?;
                return Ok(target);
            }
        }
        Err(LoggerError::file_rotation(
            self.path.display().to_string(),
            "cannot find free log number to rename",
        ))
    }

    /// Remove rotated siblings last modified more than `max_days` ago.
    fn delete_old(&self) {
        let Some(dir) = self.path.parent() else {
            return;
        };
        let Some(base) = self.path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let Some(max_age) = u64::try_from(self.rotation.max_days.max(0))
            .ok()
            .and_then(|days| days.checked_mul(SECONDS_PER_DAY))
        else {
            return;
        };
        let Some(cutoff) = SystemTime::now().checked_sub(Duration::from_secs(max_age)) else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if path == self.path || !name.starts_with(base) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let expired = metadata
                .modified()
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if metadata.is_file() && expired {
                if let Err(e) = fs::remove_file(&path) {
                    self.diagnostics.warn(
                        "Failed to remove expired log file",
                        KeyValues::new()
                            .with("path", path.display().to_string())
                            .with("err", e.to_string()),
                    );
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rotation(&self) -> &FileRotation {
        &self.rotation
    }

    /// Bytes written to the current file
    pub fn current_size(&self) -> u64 {
        self.state.lock().size
    }

    /// Lines written to the current file
    pub fn current_lines(&self) -> u64 {
        self.state.lock().lines
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[cfg(test)]
    fn set_opened_day(&self, day: NaiveDate) {
        self.state.lock().opened_day = day;
    }
}

impl Appender for RotatingFileAppender {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(LoggerError::closed(self.path.display().to_string()));
        }

        if self.should_rotate(&state) {
            if let Err(e) = self.rotate(&mut state) {
                self.diagnostics.error(
                    "Log rotation failed, continuing with current file",
                    KeyValues::new()
                        .with("path", self.path.display().to_string())
                        .with("err", e.to_string()),
                );
                if state.writer.is_none() {
                    let reopened = Self::open_state(&self.path, &self.rotation)?;
                    state.writer = reopened.writer;
                }
                // Let the file grow past its limit instead of retrying on every line.
                state.lines = 0;
                state.size = 0;
                state.opened_day = Local::now().date_naive();
            }
        }

        let mut line = self.formatter.format(entry);
        line.push('\n');

        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::closed(self.path.display().to_string()))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::io_operation(format!("writing {}", self.path.display()), e)
        })?;

        state.lines += 1;
        state.size += line.len() as u64;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.state.lock().writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Reloadable for RotatingFileAppender {
    /// Reopen the file at the configured path.
    fn reload(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(LoggerError::closed(self.path.display().to_string()));
        }
        let reopened = Self::open_state(&self.path, &self.rotation)?;
        if let Some(mut writer) = std::mem::replace(&mut *state, reopened).writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Closable for RotatingFileAppender {
    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.closed = true;
        if let Some(mut writer) = state.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.state.get_mut().writer.take() {
            let _ = writer.flush();
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn count_lines(path: &Path) -> Result<u64> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut lines = 0u64;
    loop {
        let buffer = reader.fill_buf()?;
        if buffer.is_empty() {
            break;
        }
        lines += buffer.iter().filter(|&&b| b == b'\n').count() as u64;
        let consumed = buffer.len();
        reader.consume(consumed);
    }
    Ok(lines)
}
