//! Implementation of the `ctxlog serve` command.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;

use crate::infrastructure::config::ServiceConfig;
use crate::infrastructure::http;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind, overriding `server.bind_address`
    #[arg(short, long)]
    pub bind: Option<String>,
}

pub async fn execute(args: ServeArgs, config: ServiceConfig) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind_address.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address '{bind}'"))?;

    let logger = super::start_logger(&config)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    http::serve(listener, logger).await.context("Server error")
}
