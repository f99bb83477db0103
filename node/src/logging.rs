//! Logging via the tracing crate.

use anyhow::anyhow;
use datasize::DataSize;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, DataSize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Output format for the log.
    pub format: LoggingFormat,
}

/// Logging output format.
///
/// Defaults to "text".
#[derive(Copy, Clone, Debug, Deserialize, Serialize, DataSize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFormat {
    /// Human-readable text format.
    Text,
    /// JSON format.
    Json,
}

impl Default for LoggingFormat {
    fn default() -> Self {
        LoggingFormat::Text
    }
}

/// Initializes the global tracing subscriber.
///
/// The filter is taken from `RUST_LOG` if set, defaulting to `info`. Returns
/// an error if a subscriber was already installed.
pub fn init_with_config(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LoggingFormat::Text => builder
            .try_init()
            .map_err(|error| anyhow!("failed to initialize logging: {}", error)),
        LoggingFormat::Json => builder
            .json()
            .try_init()
            .map_err(|error| anyhow!("failed to initialize logging: {}", error)),
    }
}

/// Initializes logging with the default configuration.
pub fn init() -> anyhow::Result<()> {
    init_with_config(&LoggingConfig::default())
}
