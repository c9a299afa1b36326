//! Tracing subscriber setup.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{AggregationError, Result};

/// Parse a log level name.
pub fn parse_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(AggregationError::InvalidConfig(format!(
            "unknown log level '{}'",
            other
        ))),
    }
}

/// Install the global tracing subscriber.
///
/// Fails if the level is unknown or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    let installed = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish()),
    };

    installed.map_err(|e| AggregationError::InvalidConfig(e.to_string()))
}
