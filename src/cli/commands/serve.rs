//! Implementation of the `faultline serve` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::domain::models::Config;
use crate::services::integration::LinearIntegration;

/// Arguments of `faultline serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Install a panic hook that files panics as critical faults
    #[arg(long)]
    pub capture_panics: bool,
}

/// Run the HTTP server until Ctrl-C.
pub async fn execute(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let integration =
        LinearIntegration::from_config(config).context("failed to set up Linear integration")?;

    if args.capture_panics {
        match integration.faults() {
            Some(faults) => faults.install_panic_hook(),
            None => tracing::warn!("fault reporting not configured, panics will not be filed"),
        }
    }

    integration.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
