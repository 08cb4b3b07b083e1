//! Structured logging configuration.
//!
//! Text output is the default. With JSON enabled, log entries are JSON objects:
//!
//! ```json
//! {"timestamp":"2024-01-15T10:30:00.000Z","level":"DEBUG","target":"fgadsl_domain::compiler","fields":{"message":"compiled model","types":2}}
//! ```
//!
//! `RUST_LOG` always takes precedence over the configured level.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::WARN,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration for JSON output.
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    /// Set the default log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Builds the logging configuration from loaded settings.
    ///
    /// Settings are validated at load time, so an unknown level here falls
    /// back to the default.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        let default_level = Level::from_str(&settings.level).unwrap_or(Level::WARN);
        Self {
            json_format: settings.json,
            default_level,
        }
    }
}

/// Initialize the logging subsystem with the given configuration.
///
/// Call once at startup; later calls have no effect because the subscriber
/// is global.
pub fn init_logging(config: LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()));

    if config.json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_target(true),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Creates a JSON subscriber writing to `writer`, for capturing log output
/// in tests.
pub fn create_json_layer<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new("trace"))
        .with(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true),
        )
}
