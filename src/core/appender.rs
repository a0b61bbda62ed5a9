//! Capabilities of a log output destination
//!
//! Every destination can take events. Closing and reloading are separate,
//! optional capabilities so a destination only implements what it supports.

use super::{error::Result, log_entry::LogEntry};

/// Takes formatted events. Implementations serialize their own writes.
pub trait Appender: Send + Sync {
    fn append(&self, entry: &LogEntry) -> Result<()>;
    fn flush(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str;
}

/// Releases the destination's resources.
pub trait Closable: Send + Sync {
    fn close(&self) -> Result<()>;
}

/// Re-opens the destination in place, e.g. after an external log rotation.
pub trait Reloadable: Send + Sync {
    fn reload(&self) -> Result<()>;
}
