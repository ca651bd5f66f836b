//! # Logging Utilities
//!
//! Logging infrastructure for perfmap-attach using `tracing`.
//!
//! Console output goes to **stderr**. Stdout is reserved for the messages the
//! attach command prints for whoever launched it (for example the
//! "library missing" notice), so log lines never interleave with them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use perfmap_attach_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Attaching");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=perfmap_attach_core=trace`)
//! - `PERFMAP_ATTACH_LOG_FORMAT`: Set output format (`json` or `pretty`, default: `pretty`)
//! - `PERFMAP_ATTACH_LOG_FILE`: Optional path to a daily-rolling log file

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "PERFMAP_ATTACH_LOG_FORMAT";

/// Environment variable naming an optional log file.
pub const LOG_FILE_ENV: &str = "PERFMAP_ATTACH_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `perfmap_attach_core=debug`)
/// - `PERFMAP_ATTACH_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `PERFMAP_ATTACH_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `PERFMAP_ATTACH_LOG_FORMAT` holds an unknown format
/// - File logging fails (if `PERFMAP_ATTACH_LOG_FILE` is set)
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = log_format_from_env()?;

    let env_filter = match env::var("RUST_LOG") {
        // RUST_LOG may carry per-module directives, so hand it to EnvFilter as-is
        Ok(rust_log) => EnvFilter::try_new(&rust_log).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        Err(_) => EnvFilter::new(Level::INFO.to_string()),
    };

    init_logging_internal(format, env_filter)
}

/// Initialize logging with explicit level and format
///
/// The explicit level wins over `RUST_LOG`. `PERFMAP_ATTACH_LOG_FILE` is still honoured.
///
/// ## Example
///
/// ```rust,no_run
/// use perfmap_attach_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_internal(format, EnvFilter::new(Level::from(level).to_string()))
}

/// Output format selected by `PERFMAP_ATTACH_LOG_FORMAT` (pretty when unset)
///
/// ## Errors
///
/// `InvalidFormat` if the variable holds an unknown format.
pub fn log_format_from_env() -> Result<LogFormat, LoggingError>
{
    format_from_env(env::var(LOG_FORMAT_ENV).ok().as_deref())
}

/// Parse the value of `PERFMAP_ATTACH_LOG_FORMAT`, defaulting to pretty output when unset.
fn format_from_env(value: Option<&str>) -> Result<LogFormat, LoggingError>
{
    match value {
        None => Ok(LogFormat::Pretty),
        Some(raw) if raw.trim().is_empty() => Ok(LogFormat::Pretty),
        Some(raw) => LogFormat::from_str(raw.trim()).map_err(LoggingError::InvalidFormat),
    }
}

/// Split a log file path into the directory and file name `tracing-appender` expects.
fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError>
{
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationFailed(format!("log file path has no file name: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    Ok((dir, PathBuf::from(file_name)))
}

fn init_logging_internal(format: LogFormat, env_filter: EnvFilter) -> Result<(), LoggingError>
{
    let log_file = env::var(LOG_FILE_ENV).ok().filter(|s| !s.is_empty()).map(PathBuf::from);

    let file_writer = match log_file {
        Some(path) => {
            let (dir, name) = split_log_path(&path)?;
            let appender = tracing_appender::rolling::daily(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            // The process is short-lived; keep the worker alive until exit so buffered lines flush
            std::mem::forget(guard);
            Some(non_blocking)
        }
        None => None,
    };

    let result = match format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());

            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false) // No ANSI in files
                    .with_filter(env_filter)
            });

            Registry::default().with(console_layer).with(file_layer).try_init()
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());

            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(env_filter)
            });

            Registry::default().with(console_layer).with(file_layer).try_init()
        }
    };

    result.map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
