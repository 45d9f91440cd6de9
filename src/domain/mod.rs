//! Domain layer: log levels, fields, clocks, trace-context ports and errors.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{LoggerError, LoggerResult};
