//! # Logging Module
//!
//! Sets up `tracing` to write to the configured log file.
//!
//! The file is appended to, never rotated. `RUST_LOG` overrides the
//! configured level when it is set.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{LogLevel, LoggingConfig};
use crate::error::Result;

/// Install the global subscriber writing to `config.file`
///
/// The returned guard flushes buffered lines when dropped; keep it alive
/// for the lifetime of the process.
///
/// # Errors
///
/// Returns `Io` error if the log directory cannot be created.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let (dir, file_name) = split_log_path(Path::new(&config.file));
    fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config.level))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

/// Level filter: `RUST_LOG` if set, otherwise the configured level.
fn build_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(tracing::Level::from(level).into()))
}

/// Split a log file path into its directory and file name.
fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("drone-joystick.log"));
    (dir, file_name)
}
