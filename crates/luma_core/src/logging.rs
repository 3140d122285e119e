//! Rolling file logging and panic capture.
//!
//! # Responsibility
//! - Start the file logger once per process.
//! - Route panics into the log before the default hook runs.
//!
//! # Invariants
//! - Events are metadata only: ids, counts, sizes, durations. Titles,
//!   queries, questions and image payloads are never written.
//! - Repeating init with the same settings is a no-op; different settings
//!   are rejected instead of silently reconfiguring.
//! - Init never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Once;

const LOG_BASENAME: &str = "luma";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level `{other}` (use trace, debug, info, warn or error)"
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: LogLevel,
    dir: PathBuf,
}

impl LogSettings {
    fn parse(level: &str, log_dir: &str) -> Result<Self, String> {
        let level = LogLevel::parse(level)?;
        let dir = log_dir.trim();
        if dir.is_empty() {
            return Err("log directory is empty".to_string());
        }
        let dir = Path::new(dir);
        if !dir.is_absolute() {
            return Err(format!(
                "log directory `{}` is not an absolute path",
                dir.display()
            ));
        }
        Ok(Self {
            level,
            dir: dir.to_path_buf(),
        })
    }

    /// Accepts `requested` only when it matches these active settings.
    fn accept(&self, requested: &Self) -> Result<(), String> {
        if self.dir != requested.dir {
            return Err(format!(
                "logger already writes to `{}`, cannot move to `{}`",
                self.dir.display(),
                requested.dir.display()
            ));
        }
        if self.level != requested.level {
            return Err(format!(
                "logger already runs at `{}`, cannot change to `{}`",
                self.level, requested.level
            ));
        }
        Ok(())
    }

    fn start(&self) -> Result<LoggerHandle, String> {
        std::fs::create_dir_all(&self.dir).map_err(|err| {
            format!(
                "cannot create log directory `{}`: {err}",
                self.dir.display()
            )
        })?;

        Logger::try_with_str(self.level.as_str())
            .map_err(|err| format!("cannot use log level `{}`: {err}", self.level))?
            .log_to_file(
                FileSpec::default()
                    .directory(self.dir.as_path())
                    .basename(LOG_BASENAME),
            )
            .rotate(
                Criterion::Size(ROTATE_AT_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(KEEP_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("cannot start file logger: {err}"))
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// # Errors
/// - Unknown level, empty or relative directory.
/// - Directory creation or logger start failure.
/// - Logging already active with a different level or directory.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let requested = LogSettings::parse(level, log_dir)?;

    let active = ACTIVE.get_or_try_init(|| -> Result<ActiveLogger, String> {
        let handle = requested.start()?;
        install_panic_hook();
        info!(
            "event=logging_init module=core status=ok version={} os={} profile={} level={}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            if cfg!(debug_assertions) { "debug" } else { "release" },
            requested.level
        );
        Ok(ActiveLogger {
            settings: requested.clone(),
            _handle: handle,
        })
    })?;

    active.settings.accept(&requested)
}

/// Active `(level, log_dir)`, or `None` before [`init_logging`] succeeded.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.settings.level.as_str(), active.settings.dir.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|message| (*message).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string payload>".to_string());
            error!(
                "event=panic module=core status=error location={location} payload={}",
                single_line(&payload, PANIC_PAYLOAD_LIMIT)
            );
            previous(info);
        }));
    });
}

/// Flattens `value` to one line of at most `limit` chars plus an ellipsis.
fn single_line(value: &str, limit: usize) -> String {
    let flat: String = value
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .collect();
    if flat.chars().count() <= limit {
        return flat;
    }
    let mut capped: String = flat.chars().take(limit).collect();
    capped.push_str("...");
    capped
}
