//! Structured logging infrastructure for Relay.
//!
//! This module installs a `tracing` subscriber in one of several output
//! formats, writing to stdout, a non-blocking file, or both.
//!
//! Invariant violations are logged at `error` level under the
//! [`INTEGRITY_TARGET`] target so they can be routed separately from
//! ordinary business rejections, which stay at `debug`.


use crate::config::{LogFormat, LogLevel, LoggingConfig};
use std::path::Path;
use std::sync::OnceLock;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{Layer, Registry, filter::LevelFilter, fmt, prelude::*};

/// Target used for events reporting broken relationship invariants.
pub const INTEGRITY_TARGET: &str = "relay::integrity";

/// Keeps the file writer flushing for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Error type for logging operations
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing log level
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Error in subscriber setup
    #[error("Subscriber error: {0}")]
    SubscriberError(String),

    /// General error
    #[error("{0}")]
    Other(String),
}

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Initialize the logging system with the given configuration.
///
/// Calling this after a global subscriber is already installed is not an
/// error; the existing subscriber stays in place.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = match config.level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    };

    let writer = match &config.file {
        Some(path) => {
            let (file_writer, guard) = create_non_blocking_file(path)?;
            let _ = FILE_GUARD.set(guard);
            if config.stdout {
                BoxMakeWriter::new(std::io::stdout.and(file_writer))
            } else {
                BoxMakeWriter::new(file_writer)
            }
        }
        None if config.stdout => BoxMakeWriter::new(std::io::stdout),
        None => BoxMakeWriter::new(std::io::sink),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_line_number(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Default => fmt::layer().with_target(true).with_writer(writer).boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(layer.with_filter(LevelFilter::from_level(level)))
        .try_init();

    if let Err(e) = installed {
        tracing::debug!("Logging already initialized, keeping existing subscriber: {}", e);
    }

    Ok(())
}

/// Create a non-blocking file writer.
pub(crate) fn create_non_blocking_file(
    path: impl AsRef<Path>,
) -> Result<(NonBlocking, WorkerGuard)> {
    let path = path.as_ref();

    let file_name = path
        .file_name()
        .ok_or_else(|| LogError::Other(format!("Log path has no file name: {}", path.display())))?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));

    if !directory.as_os_str().is_empty() && !directory.exists() {
        std::fs::create_dir_all(directory)?;
    }

    let file_appender = tracing_appender::rolling::never(directory, file_name);

    Ok(tracing_appender::non_blocking(file_appender))
}

/// Parse a log level string into a LogLevel enum.
pub fn parse_log_level(level: &str) -> Result<LogLevel> {
    level
        .parse::<LogLevel>()
        .map_err(|_| LogError::InvalidLogLevel(level.to_string()))
}

/// Convert a tracing::Level to a LogLevel enum.
pub fn level_to_log_level(level: Level) -> LogLevel {
    match level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}
