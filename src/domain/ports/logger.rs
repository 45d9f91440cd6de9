use std::fmt;
use std::str::FromStr;

use crate::domain::errors::LoggerError;

/// Log level enumeration for structured logging
///
/// Levels are ordered from most verbose (Trace) to most severe (Error).
/// A sink configured for level `L` accepts `L` and every level above it.
///
/// # Examples
///
/// ```
/// use ctxlog::domain::ports::Level;
///
/// assert!(Level::Error > Level::Info);
/// assert!(Level::Trace < Level::Debug);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Most verbose level - detailed trace information
    Trace,
    /// Debug information useful during development
    Debug,
    /// Informational messages about normal operations
    Info,
    /// Warning messages for potentially problematic situations
    Warn,
    /// Error messages for failure conditions
    Error,
}

impl Level {
    /// Returns the upper-case representation written to the `level` key
    ///
    /// # Examples
    ///
    /// ```
    /// use ctxlog::domain::ports::Level;
    ///
    /// assert_eq!(Level::Info.as_str(), "INFO");
    /// assert_eq!(Level::Error.as_str(), "ERROR");
    /// ```
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Whether a sink whose minimum severity is `threshold` accepts this level
    pub fn passes(self, threshold: Self) -> bool {
        self >= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LoggerError::InvalidLevel(s.to_string())),
        }
    }
}

impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => Self::TRACE,
            Level::Debug => Self::DEBUG,
            Level::Info => Self::INFO,
            Level::Warn => Self::WARN,
            Level::Error => Self::ERROR,
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

impl From<Level> for tracing_subscriber::filter::LevelFilter {
    fn from(level: Level) -> Self {
        Self::from_level(level.into())
    }
}
