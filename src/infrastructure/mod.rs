//! Infrastructure layer module
//!
//! - Configuration loading (figment)
//! - HTTP trace-context adapters and the demo service
//! - Logging sinks, formatting and rotation

pub mod config;
pub mod http;
pub mod logging;
