//! ctxlog - request-correlated structured logging
//!
//! Every entry is a single JSON line carrying the level, a timestamp, the
//! caller's `dir/file.rs:line`, the message, an optional `trace_id` taken
//! from the current HTTP request, and any caller-supplied fields. Entries
//! go to two sinks with independent thresholds:
//!
//! - console (`DEBUG` and above by default), serialized behind a lock
//! - a time-rotated file (`INFO` and above), by default
//!   `./logs/%Y%m%d/info.log-%Y%m%d%H%M`, a new file every 4 hours, files
//!   older than 30 days removed
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): levels, fields, clock and trace-context ports
//! - **Infrastructure Layer** (`infrastructure`): sinks, formatting, rotation,
//!   configuration loading and HTTP adapters
//! - **CLI Layer** (`cli`): the `ctxlog` binary
//!
//! # Example
//!
//! ```no_run
//! use ctxlog::{field, InboundRequest, LogConfig, Logger};
//!
//! let (logger, status) = Logger::new(LogConfig::default())?;
//! if !status.is_ready() {
//!     eprintln!("logging degraded: {status:?}");
//! }
//!
//! let request = http::Request::builder()
//!     .header("trace_id", "req-001")
//!     .body(())
//!     .unwrap();
//! let ctx = InboundRequest::new(&request);
//! logger.info(Some(&ctx), "user login", &[field("user_id", 42)]);
//! # Ok::<(), ctxlog::LoggerError>(())
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::errors::{LoggerError, LoggerResult};
pub use domain::models::{field, DurationUnit, Field, FieldValue};
pub use domain::ports::{Clock, HeaderLookup, Level, ManualClock, SystemClock, TraceContext};
pub use infrastructure::config::{ConfigError, ConfigLoader, ServerConfig, ServiceConfig};
pub use infrastructure::http::{HeaderContext, InboundRequest, RequestIdResponse, RequestTrace};
pub use infrastructure::logging::{
    ConsoleConfig, ConsoleTarget, EncoderConfig, FileConfig, InitStatus, LockedWriter, LogConfig,
    Logger, LoggerBuilder, RotatingFileWriter, TimeZoneMode,
};
