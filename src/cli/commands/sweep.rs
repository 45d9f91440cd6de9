//! Implementation of the `ctxlog sweep` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ServiceConfig;

#[derive(Args, Debug)]
pub struct SweepArgs {}

#[derive(Debug, Serialize)]
pub struct SweepOutput {
    pub removed: usize,
    pub active_file: Option<PathBuf>,
}

impl CommandOutput for SweepOutput {
    fn to_human(&self) -> String {
        let mut line = format!("Removed {} expired log file(s)", self.removed);
        if let Some(active) = &self.active_file {
            line.push_str(&format!("\nActive file: {}", active.display()));
        }
        line
    }
}

pub fn execute(_args: SweepArgs, config: &ServiceConfig, json_mode: bool) -> Result<()> {
    let logger = super::start_logger(config)?;
    let Some(writer) = logger.file_writer() else {
        anyhow::bail!("The file sink is disabled or could not be opened");
    };

    let removed = writer.sweep().context("Retention sweep failed")?;
    output(
        &SweepOutput {
            removed,
            active_file: writer.current_path(),
        },
        json_mode,
    );
    Ok(())
}
