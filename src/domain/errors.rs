//! Domain errors for the ctxlog logger.

use thiserror::Error;

/// Errors raised while configuring or building a [`Logger`](crate::Logger).
///
/// Nothing in the emit path returns these: once a logger exists, logging
/// failures are reported on stderr and never reach the caller.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid rotation policy: {0}")]
    InvalidRotation(String),

    #[error("Invalid filter directive: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("A global logger has already been installed")]
    GlobalAlreadySet,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LoggerResult<T> = Result<T, LoggerError>;
