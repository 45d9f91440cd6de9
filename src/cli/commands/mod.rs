//! CLI command implementations.

pub mod config;
pub mod emit;
pub mod serve;
pub mod sweep;

use anyhow::{Context, Result};

use crate::infrastructure::config::{ConfigLoader, ServiceConfig};
use crate::infrastructure::logging::{InitStatus, Logger};

/// Load configuration from `path`, or from the default locations
pub fn load_config(path: Option<&std::path::Path>) -> Result<ServiceConfig> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Build the logger for a command and route `tracing` macros to it
pub fn start_logger(config: &ServiceConfig) -> Result<Logger> {
    let (logger, status) =
        Logger::new(config.logging.clone()).context("Failed to build logger")?;
    if let InitStatus::Degraded { reasons } = &status {
        for reason in reasons {
            eprintln!("warning: {reason}");
        }
    }
    logger
        .install_global()
        .context("Failed to install global logger")?;
    Ok(logger)
}
