//! Process-wide log setup for the reading-list core.
//!
//! # Responsibility
//! - Start one rotating file logger per process.
//! - Route panics through the logger before the default hook runs.
//!
//! # Invariants
//! - Repeating `init_logging` with the same level and directory is a no-op.
//! - A second, different configuration is rejected rather than applied.
//! - Events are metadata-only: entry ids and counts, never titles or content.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "reading-list";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 4;
const PANIC_PAYLOAD_LIMIT: usize = 200;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    status: LoggingStatus,
    _handle: LoggerHandle,
}

/// Configuration of the running logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatus {
    pub level: &'static str,
    pub log_dir: PathBuf,
}

/// Logger setup failures.
#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    RelativeDirectory(PathBuf),
    /// Logger already runs with a different configuration.
    AlreadyInitialized(LoggingStatus),
    CreateDirectory(std::io::Error),
    Backend(flexi_logger::FlexiLoggerError),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => {
                write!(f, "unknown log level `{level}`; expected one of {LEVELS:?}")
            }
            Self::RelativeDirectory(dir) => {
                write!(f, "log directory must be absolute, got `{}`", dir.display())
            }
            Self::AlreadyInitialized(active) => write!(
                f,
                "logging already running at level `{}` in `{}`",
                active.level,
                active.log_dir.display()
            ),
            Self::CreateDirectory(err) => write!(f, "could not create log directory: {err}"),
            Self::Backend(err) => write!(f, "could not start logger: {err}"),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory(err) => Some(err),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts file logging at `level` under `log_dir`.
///
/// # Errors
/// - `UnknownLevel` / `RelativeDirectory` for bad arguments.
/// - `AlreadyInitialized` when a different configuration is already active.
/// - `CreateDirectory` / `Backend` when the logger cannot start.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    let wanted = LoggingStatus {
        level: parse_level(level)?,
        log_dir: absolute_dir(log_dir.as_ref())?,
    };

    let active = ACTIVE.get_or_try_init(|| start_logger(&wanted))?;
    if active.status != wanted {
        return Err(LoggingError::AlreadyInitialized(active.status.clone()));
    }
    Ok(())
}

/// Returns the active configuration, if logging was started.
pub fn logging_status() -> Option<LoggingStatus> {
    ACTIVE.get().map(|active| active.status.clone())
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(status: &LoggingStatus) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&status.log_dir).map_err(LoggingError::CreateDirectory)?;
    let handle = Logger::try_with_str(status.level)
        .map_err(LoggingError::Backend)?
        .log_to_file(
            FileSpec::default()
                .directory(status.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    install_panic_logger();
    info!(
        "event=logging_start module=core status=ok level={} version={}",
        status.level,
        env!("CARGO_PKG_VERSION")
    );
    Ok(ActiveLogger {
        status: status.clone(),
        _handle: handle,
    })
}

fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    let lowered = level.trim().to_ascii_lowercase();
    let lowered = if lowered == "warning" { "warn".to_string() } else { lowered };
    LEVELS
        .iter()
        .copied()
        .find(|known| *known == lowered)
        .ok_or(LoggingError::UnknownLevel(lowered))
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, LoggingError> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Err(LoggingError::RelativeDirectory(dir.to_path_buf()))
    }
}

fn install_panic_logger() {
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
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic module=core status=error location={} payload={}",
            location,
            single_line(&payload, PANIC_PAYLOAD_LIMIT)
        );
        previous(info);
    }));
}

/// Flattens newlines and caps the length of free text before logging it.
fn single_line(value: &str, limit: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let mut capped: String = flat.chars().take(limit).collect();
    capped.push_str("...");
    capped
}

#[cfg(test)]
mod tests {
    use super::{absolute_dir, init_logging, logging_status, parse_level, single_line, LoggingError};
    use std::path::Path;

    #[test]
    fn parse_level_normalizes_case_and_aliases() {
        assert_eq!(parse_level(" INFO ").unwrap(), "info");
        assert_eq!(parse_level("Warning").unwrap(), "warn");
        assert!(matches!(
            parse_level("verbose"),
            Err(LoggingError::UnknownLevel(_))
        ));
    }

    #[test]
    fn relative_directories_are_rejected() {
        assert!(matches!(
            absolute_dir(Path::new("logs/dev")),
            Err(LoggingError::RelativeDirectory(_))
        ));
    }

    #[test]
    fn single_line_flattens_and_caps() {
        assert_eq!(single_line("a\nb", 10), "a b");
        assert_eq!(single_line("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn init_is_idempotent_and_rejects_reconfiguration() {
        let dir = tempfile::TempDir::new().unwrap();
        let other = tempfile::TempDir::new().unwrap();

        init_logging("info", dir.path()).unwrap();
        init_logging("info", dir.path()).unwrap();
        assert!(matches!(
            init_logging("debug", dir.path()),
            Err(LoggingError::AlreadyInitialized(_))
        ));
        assert!(matches!(
            init_logging("info", other.path()),
            Err(LoggingError::AlreadyInitialized(_))
        ));

        let status = logging_status().unwrap();
        assert_eq!(status.level, "info");
        assert_eq!(status.log_dir, dir.path());
    }
}
