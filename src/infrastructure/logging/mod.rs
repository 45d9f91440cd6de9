//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON line formatting with caller location and trace ids
//! - Console sink behind a lock
//! - Time and size based file rotation with retention

pub mod config;
pub mod format;
pub mod logger;
pub mod rotation;
pub mod writer;

pub use config::{
    ConsoleConfig, ConsoleTarget, EncoderConfig, FileConfig, LogConfig, TimeZoneMode,
    DEFAULT_FILE_PATTERN, DEFAULT_RETENTION_DAYS, DEFAULT_ROTATION_SECS, DEFAULT_TIME_FORMAT,
};
pub use format::{short_caller, JsonEventFormat, TRACE_ID};
pub use logger::{InitStatus, Logger, LoggerBuilder};
pub use rotation::{slot_start, FilePattern, RotatingFileWriter, RotationPolicy};
pub use writer::LockedWriter;
