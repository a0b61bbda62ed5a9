//! Appender implementations

pub mod console;
pub mod memory;
#[cfg(feature = "file")]
pub mod rotating_file;
pub mod syslog;

pub use console::ConsoleAppender;
pub use memory::{MemoryAppender, MemoryWriter};
#[cfg(feature = "file")]
pub use rotating_file::{FileRotation, RotatingFileAppender};
pub use syslog::{Facility, SyslogAppender, SyslogSettings};

pub use crate::core::{Appender, Closable, Reloadable};
