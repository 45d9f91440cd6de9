//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation

pub mod loader;
pub mod service;

pub use loader::{ConfigError, ConfigLoader, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use service::{ServerConfig, ServiceConfig};
