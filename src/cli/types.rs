//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::{config::ConfigArgs, emit::EmitArgs, serve::ServeArgs, sweep::SweepArgs};

#[derive(Parser, Debug)]
#[command(name = "ctxlog")]
#[command(about = "Request-correlated structured logging", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./ctxlog.yaml when present)
    #[arg(short, long, global = true, env = "CTXLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the demo HTTP service
    Serve(ServeArgs),

    /// Write a single log entry through the configured sinks
    Emit(EmitArgs),

    /// Apply the file retention policy once
    Sweep(SweepArgs),

    /// Print the effective configuration
    Config(ConfigArgs),
}
