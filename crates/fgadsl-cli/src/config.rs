//! Configuration for the `fgadsl` command.
//!
//! Configuration is layered from three sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML, via `--config`)
//! 3. Environment variables (override)
//!
//! Environment variables use the `FGADSL_` prefix and `__` between nested
//! keys, e.g. `FGADSL_COMPILER__FALLBACK_USER_TYPE=employee` or
//! `FGADSL_LOGGING__LEVEL=debug`.
//!
//! # Example YAML Configuration
//!
//! ```yaml
//! compiler:
//!   default_schema_version: "1.1"
//!   fallback_user_type: user
//!   max_input_bytes: 1048576
//! logging:
//!   level: warn
//!   json: false
//! ```

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use fgadsl_domain::CompilerConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix.
const ENV_PREFIX: &str = "FGADSL";

/// Command configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CliConfig {
    /// Compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl CliConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&CliConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let cli_config: CliConfig = config.try_deserialize()?;
        cli_config.validate()?;

        Ok(cli_config)
    }

    /// Load configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&CliConfig::default())?)
            .add_source(environment())
            .build()?;

        let cli_config: CliConfig = config.try_deserialize()?;
        cli_config.validate()?;

        Ok(cli_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        if self.compiler.default_schema_version.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: "compiler.default_schema_version must not be empty".to_string(),
            });
        }

        if self.compiler.fallback_user_type.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: "compiler.fallback_user_type must not be empty".to_string(),
            });
        }

        if self.compiler.max_input_bytes == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "compiler.max_input_bytes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
