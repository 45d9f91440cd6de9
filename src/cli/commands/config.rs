//! Implementation of the `ctxlog config` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ServiceConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigOutput(pub ServiceConfig);

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.0).unwrap_or_default()
    }
}

pub fn execute(_args: ConfigArgs, config: ServiceConfig, json_mode: bool) -> Result<()> {
    output(&ConfigOutput(config), json_mode);
    Ok(())
}
