//! Run log at `~/.newsdesk/newsdesk.log`.
//!
//! The dashboard owns the terminal, so pipeline progress, engine payloads and
//! step warnings go to this file instead. It is truncated at startup and holds
//! one line per event: `[HH:MM:SS.mmm] [LEVEL] message`.
//!
//! The threshold is INFO unless `--debug` or `NEWSDESK_DEBUG=1` raises it to
//! DEBUG, or `NEWSDESK_LOG=<level>` names one explicitly. TRACE adds the raw
//! stdout of engine runs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();
static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Case-insensitive level name, as accepted by `NEWSDESK_LOG`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(name))
    }

    fn from_u8(v: u8) -> Self {
        Self::ALL
            .get(usize::from(v))
            .copied()
            .unwrap_or(LogLevel::Trace)
    }
}

/// Threshold for a run: an explicit `NEWSDESK_LOG` wins, then the debug flags.
fn startup_level(debug_flag: bool, debug_env: Option<&str>, level_env: Option<&str>) -> LogLevel {
    if let Some(level) = level_env.and_then(LogLevel::parse) {
        return level;
    }
    let debug_env = debug_env.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if debug_flag || debug_env {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

/// Set the threshold from flags and environment, and start a fresh log file.
pub fn init_with_debug(debug: bool) {
    let debug_env = std::env::var("NEWSDESK_DEBUG").ok();
    let level_env = std::env::var("NEWSDESK_LOG").ok();
    set_level(startup_level(debug, debug_env.as_deref(), level_env.as_deref()));

    let Some(dir) = dirs::home_dir().map(|h| h.join(".newsdesk")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let path = dir.join("newsdesk.log");
    if std::fs::write(&path, "").is_ok() {
        LOG_FILE.set(path).ok();
    }
}

pub fn set_level(level: LogLevel) {
    THRESHOLD.store(level as u8, Ordering::SeqCst);
}

pub fn level() -> LogLevel {
    LogLevel::from_u8(THRESHOLD.load(Ordering::Relaxed))
}

pub fn log_at(level: LogLevel, msg: &str) {
    if level > self::level() {
        return;
    }
    let Some(path) = LOG_FILE.get() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let _ = writeln!(file, "[{}] [{}] {}", stamp, level.label(), msg);
    }
}

pub fn error(msg: &str) {
    log_at(LogLevel::Error, msg);
}

pub fn warn(msg: &str) {
    log_at(LogLevel::Warn, msg);
}

pub fn info(msg: &str) {
    log_at(LogLevel::Info, msg);
}

pub fn debug(msg: &str) {
    log_at(LogLevel::Debug, msg);
}

pub fn trace(msg: &str) {
    log_at(LogLevel::Trace, msg);
}

/// INFO line, `format!` syntax.
#[macro_export]
macro_rules! nlog {
    ($($arg:tt)*) => {
        $crate::log::info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! nlog_error {
    ($($arg:tt)*) => {
        $crate::log::error(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! nlog_warn {
    ($($arg:tt)*) => {
        $crate::log::warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! nlog_debug {
    ($($arg:tt)*) => {
        $crate::log::debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! nlog_trace {
    ($($arg:tt)*) => {
        $crate::log::trace(&format!($($arg)*))
    };
}
