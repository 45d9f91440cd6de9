//! Command-line interface of the `ctxlog` binary.

pub mod commands;
pub mod output;
pub mod types;

pub use output::{handle_error, output, CommandOutput};
pub use types::{Cli, Commands};
