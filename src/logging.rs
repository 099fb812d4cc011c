//! Tracing subscriber setup.
//!
//! Logs go to stderr so that `--json` output on stdout stays parseable.
//! `RUST_LOG`, when set, replaces the configured level.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Parse log level string to Level
pub fn parse_log_level(level: &str) -> Result<Level, LoggingError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(LoggingError::InvalidLevel(level.to_string())),
    }
}

/// Effective level: `debug = true` in the settings raises it to DEBUG.
pub fn effective_level(config: &LoggingConfig, debug: bool) -> Result<Level, LoggingError> {
    let level = parse_log_level(&config.level)?;
    Ok(if debug { level.max(Level::DEBUG) } else { level })
}

/// Install the global subscriber.
///
/// # Errors
/// Fails on an unknown level or when a subscriber is already installed.
pub fn init(config: &LoggingConfig, debug: bool) -> Result<(), LoggingError> {
    let default_level = effective_level(config, debug)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(level = %default_level, json = config.json, "logger initialized");
    Ok(())
}
