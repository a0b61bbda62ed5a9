//! Syslog appender
//!
//! Sends each event as one BSD-syslog (RFC 3164) datagram, or one
//! newline-terminated record over TCP:
//!
//! ```text
//! <PRI>Oct 18 09:15:02 tag[pid]: level=info msg=...
//! ```
//!
//! With no `network` configured the local syslog daemon socket is used.

use crate::core::{
    Appender, Closable, Formatter, LogEntry, LogLevel, LoggerError, OutputFormat, Result, Section,
};
use chrono::Local;
use parking_lot::Mutex;
use std::io::Write;
use std::net::{TcpStream, UdpSocket};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixDatagram;

/// Local daemon sockets, tried in order
#[cfg(unix)]
const LOCAL_SOCKETS: [&str; 3] = ["/dev/log", "/var/run/syslog", "/var/run/log"];

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Syslog facility codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Kern = 0,
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    Authpriv = 10,
    Ftp = 11,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl Facility {
    pub fn from_name(name: &str) -> Option<Self> {
        let facility = match name.trim().to_lowercase().as_str() {
            "kern" => Facility::Kern,
            "user" => Facility::User,
            "mail" => Facility::Mail,
            "daemon" => Facility::Daemon,
            "auth" => Facility::Auth,
            "syslog" => Facility::Syslog,
            "lpr" => Facility::Lpr,
            "news" => Facility::News,
            "uucp" => Facility::Uucp,
            "cron" => Facility::Cron,
            "authpriv" => Facility::Authpriv,
            "ftp" => Facility::Ftp,
            "local0" => Facility::Local0,
            "local1" => Facility::Local1,
            "local2" => Facility::Local2,
            "local3" => Facility::Local3,
            "local4" => Facility::Local4,
            "local5" => Facility::Local5,
            "local6" => Facility::Local6,
            "local7" => Facility::Local7,
            _ => return None,
        };
        Some(facility)
    }
}

/// Syslog severity for an event level
fn severity(level: LogLevel) -> u8 {
    match level {
        LogLevel::Trace | LogLevel::Debug => 7,
        LogLevel::Info => 6,
        LogLevel::Warn => 4,
        LogLevel::Error => 3,
        LogLevel::Critical => 2,
    }
}

/// Connection settings read from a `log.syslog` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogSettings {
    /// `""` for the local daemon, or `unix`, `udp`, `tcp`
    pub network: String,
    /// Socket path or `host:port`
    pub address: String,
    pub facility: Facility,
    pub tag: String,
}

impl Default for SyslogSettings {
    fn default() -> Self {
        Self {
            network: String::new(),
            address: String::new(),
            facility: Facility::User,
            tag: default_tag(),
        }
    }
}

impl SyslogSettings {
    /// Read `network`, `address`, `facility` and `tag`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown facility name
    pub fn from_section(section: &Section) -> Result<Self> {
        let facility_name = section.must_string("facility", "user");
        let facility = Facility::from_name(&facility_name).ok_or_else(|| {
            LoggerError::config("log.syslog", format!("unknown facility '{}'", facility_name))
        })?;

        Ok(Self {
            network: section.must_string("network", ""),
            address: section.must_string("address", ""),
            facility,
            tag: section.must_string("tag", &default_tag()),
        })
    }
}

fn default_tag() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "rust_log_pipeline".to_string())
}

enum Connection {
    #[cfg(unix)]
    Unix(UnixDatagram),
    Udp(UdpSocket),
    Tcp(TcpStream),
}

impl Connection {
    fn open(settings: &SyslogSettings) -> Result<Self> {
        let fail = |message: String| LoggerError::syslog(settings.address.clone(), message);

        match settings.network.as_str() {
            "" => Self::open_local(settings),
            #[cfg(unix)]
            "unix" | "unixgram" => {
                let socket = UnixDatagram::unbound()?;
                socket
                    .connect(&settings.address)
                    .map_err(|e| fail(e.to_string()))?;
                Ok(Connection::Unix(socket))
            }
            "udp" | "udp4" | "udp6" => {
                let bind = if settings.network == "udp6" { "[::]:0" } else { "0.0.0.0:0" };
                let socket = UdpSocket::bind(bind)?;
                socket
                    .connect(&settings.address)
                    .map_err(|e| fail(e.to_string()))?;
                Ok(Connection::Udp(socket))
            }
            "tcp" | "tcp4" | "tcp6" => {
                let stream =
                    TcpStream::connect(&settings.address).map_err(|e| fail(e.to_string()))?;
                stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                stream.set_nodelay(true)?;
                Ok(Connection::Tcp(stream))
            }
            other => Err(LoggerError::config(
                "log.syslog",
                format!("unsupported network '{}'", other),
            )),
        }
    }

    #[cfg(unix)]
    fn open_local(settings: &SyslogSettings) -> Result<Self> {
        let socket = UnixDatagram::unbound()?;
        let candidates: Vec<&str> = if settings.address.is_empty() {
            LOCAL_SOCKETS.to_vec()
        } else {
            vec![settings.address.as_str()]
        };
        for path in &candidates {
            if socket.connect(path).is_ok() {
                return Ok(Connection::Unix(socket));
            }
        }
        Err(LoggerError::syslog(
            candidates.join(","),
            "no local syslog socket reachable",
        ))
    }

    #[cfg(not(unix))]
    fn open_local(settings: &SyslogSettings) -> Result<Self> {
        Err(LoggerError::syslog(
            settings.address.clone(),
            "local syslog is not available on this platform",
        ))
    }

    fn send(&mut self, record: &str) -> std::io::Result<()> {
        match self {
            #[cfg(unix)]
            Connection::Unix(socket) => socket.send(record.as_bytes()).map(|_| ()),
            Connection::Udp(socket) => socket.send(record.as_bytes()).map(|_| ()),
            Connection::Tcp(stream) => {
                stream.write_all(record.as_bytes())?;
                stream.write_all(b"\n")
            }
        }
    }
}

/// Appender writing to a syslog daemon. Closable, not reloadable.
pub struct SyslogAppender {
    formatter: Formatter,
    settings: SyslogSettings,
    pid: u32,
    connection: Mutex<Option<Connection>>,
}

impl SyslogAppender {
    /// Connect according to `settings`.
    ///
    /// # Errors
    ///
    /// Returns error if the socket cannot be created or connected
    pub fn new(settings: SyslogSettings, format: OutputFormat) -> Result<Self> {
        let connection = Connection::open(&settings)?;
        Ok(Self {
            formatter: format.formatter(false),
            settings,
            pid: std::process::id(),
            connection: Mutex::new(Some(connection)),
        })
    }

    pub fn settings(&self) -> &SyslogSettings {
        &self.settings
    }

    fn record(&self, entry: &LogEntry) -> String {
        let priority = (self.settings.facility as u8) * 8 + severity(entry.level);
        format!(
            "<{}>{} {}[{}]: {}",
            priority,
            entry.timestamp.with_timezone(&Local).format("%b %e %H:%M:%S"),
            self.settings.tag,
            self.pid,
            self.formatter.format(entry)
        )
    }
}

impl Appender for SyslogAppender {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let record = self.record(entry);
        let mut connection = self.connection.lock();
        let conn = connection
            .as_mut()
            .ok_or_else(|| LoggerError::closed("syslog"))?;
        conn.send(&record)
            .map_err(|e| LoggerError::io_operation("sending to syslog", e))
    }

    fn name(&self) -> &str {
        "syslog"
    }
}

impl Closable for SyslogAppender {
    fn close(&self) -> Result<()> {
        if let Some(Connection::Tcp(stream)) = self.connection.lock().take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        Ok(())
    }
}
