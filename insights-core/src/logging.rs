//! Tracing subscriber setup for the binaries.
//!
//! Filter directives come from `RUST_LOG` when set, otherwise from the
//! caller's default (e.g. `warn,insights_core=info,insights=info`).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Flushes the file writer on exit; lives for the whole process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directives}': {reason}")]
    Filter { directives: String, reason: String },

    #[error("failed to open log file {path}: {reason}")]
    File { path: PathBuf, reason: String },

    #[error("global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Resolve the filter: `RUST_LOG` if present, else `default_directives`.
pub fn env_filter(default_directives: &str) -> Result<EnvFilter, LoggingError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => parse_filter(&directives),
        _ => parse_filter(default_directives),
    }
}

fn parse_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|e| LoggingError::Filter {
        directives: directives.to_string(),
        reason: e.to_string(),
    })
}

/// Human-readable logs on stderr.
pub fn init_logging(default_directives: &str) -> Result<(), LoggingError> {
    let filter = env_filter(default_directives)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))
}

/// Logs appended to `path`, no ANSI colors. Used by the TUI so log lines never
/// land on the alternate screen.
pub fn init_file_logging(path: &Path, default_directives: &str) -> Result<(), LoggingError> {
    let filter = env_filter(default_directives)?;
    let appender = file_appender(path)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;
    FILE_GUARD.set(guard).ok();
    Ok(())
}

/// Single never-rotated file; the appender creates the parent directory.
fn file_appender(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let file_err = |reason: String| LoggingError::File {
        path: path.to_path_buf(),
        reason,
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| file_err("path has no file name".into()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| file_err(e.to_string()))
}
