//! faultline CLI entry point.

use anyhow::Result;
use clap::Parser;

use faultline::cli::{commands, handle_error, Cli, Commands};
use faultline::infrastructure::logging::{LogConfig, LoggerImpl};
use faultline::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let mut log_config = LogConfig::from_settings(&config.logging)?;
    if matches!(cli.command, Commands::Report(_)) {
        // Keep one-shot output readable
        log_config.level = "warn".to_string();
    }
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Report(args) => commands::report::execute(args, config, cli.json).await,
    }
}
