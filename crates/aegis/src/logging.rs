//! Process-wide log output.
//!
//! Library code logs through both the `log` facade and `tracing`; [`init`]
//! routes `log` records into `tracing` and installs one fmt subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigError;

/// Parses an `EnvFilter` directive such as `info` or `aegis=debug,warn`.
pub fn build_filter(directive: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(directive)
        .map_err(|e| ConfigError::Logging(format!("invalid filter '{}': {}", directive, e)))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_filter(&config.level)?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(false).boxed(),
    };
    let subscriber = tracing_subscriber::registry().with(fmt_layer).with(filter);

    tracing_log::LogTracer::init().map_err(|e| ConfigError::Logging(e.to_string()))?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
