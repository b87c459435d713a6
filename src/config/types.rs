use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::{LoggingConfig, LOG_LEVELS};
use super::metrics::MetricsConfig;

pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

/// Top-level service configuration.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".into()));
        }
        if self.metrics.active_users_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "metrics.active_users_interval_secs must be at least 1".into(),
            ));
        }
        if !self.logging.has_valid_level() {
            return Err(ConfigError::Invalid(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Builds the layered configuration source.
///
/// Defaults come first, then the optional YAML file at `path`, then
/// `APP_`-prefixed environment variables (`__` separates nested keys).
/// `PORT` is honoured last so container platforms can override the port
/// without knowing the prefix.
pub fn figment(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed("APP_").split("__"))
        .merge(Env::raw().only(&["PORT"]))
}

/// Load and validate the configuration. A missing file is not an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    config.validate()?;
    Ok(config)
}

/// Render the JSON schema for the configuration.
pub fn schema_json() -> Result<String, serde_json::Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}
