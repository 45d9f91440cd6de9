use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use super::service::ServiceConfig;
use crate::domain::errors::LoggerError;
use crate::domain::ports::Level;
use crate::infrastructure::logging::{FilePattern, RotationPolicy};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ctxlog.yaml";

/// Prefix of environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "CTXLOG_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {sink} log level: {level}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel { sink: &'static str, level: String },

    #[error("Invalid bind address '{0}': expected host:port")]
    InvalidBindAddress(String),

    #[error("Encoder key '{0}' cannot be empty")]
    EmptyEncoderKey(&'static str),

    #[error("Encoder key '{0}' is used more than once")]
    DuplicateEncoderKey(String),

    #[error(transparent)]
    Logger(#[from] LoggerError),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `ctxlog.yaml` in the working directory (optional)
    /// 3. Environment variables (`CTXLOG_*`, `__` for nesting)
    pub fn load() -> Result<ServiceConfig> {
        let config: ServiceConfig = Self::figment(Yaml::file(DEFAULT_CONFIG_FILE))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<ServiceConfig> {
        let path = path.as_ref();
        ensure!(path.is_file(), "Config file {} does not exist", path.display());

        let config: ServiceConfig = Self::figment(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(file: figment::providers::Data<Yaml>) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(ServiceConfig::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &ServiceConfig) -> Result<(), ConfigError> {
        let logging = &config.logging;

        for (sink, level) in [
            ("console", &logging.console.level),
            ("file", &logging.file.level),
        ] {
            if level.parse::<Level>().is_err() {
                return Err(ConfigError::InvalidLogLevel {
                    sink,
                    level: level.clone(),
                });
            }
        }

        FilePattern::parse(&logging.file.pattern)?;
        RotationPolicy::from_config(&logging.file)?;

        if config.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidBindAddress(
                config.server.bind_address.clone(),
            ));
        }

        let encoder = &logging.encoder;
        let keys = [
            ("message_key", &encoder.message_key),
            ("level_key", &encoder.level_key),
            ("time_key", &encoder.time_key),
            ("caller_key", &encoder.caller_key),
        ];
        let mut seen = HashSet::new();
        for (name, key) in keys {
            if key.is_empty() {
                return Err(ConfigError::EmptyEncoderKey(name));
            }
            if !seen.insert(key.as_str()) {
                return Err(ConfigError::DuplicateEncoderKey(key.clone()));
            }
        }

        Ok(())
    }
}
