//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::report::ReportArgs;
use commands::serve::ServeArgs;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(about = "Linear fault reporting and webhook relay", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file (defaults to ./faultline.yaml and ./faultline.local.yaml)
    #[arg(short, long, global = true, env = "FAULTLINE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the webhook and OAuth routes
    Serve(ServeArgs),

    /// File a single fault report
    Report(ReportArgs),
}

/// Print `err` (as JSON when requested) and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_command() {
        let cli = Cli::try_parse_from([
            "faultline",
            "--json",
            "report",
            "--message",
            "boom",
            "--severity",
            "critical",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.message, "boom");
                assert_eq!(args.severity.as_deref(), Some("critical"));
            }
            Commands::Serve(_) => panic!("expected report"),
        }
    }

    #[test]
    fn test_parse_serve_with_config() {
        let cli =
            Cli::try_parse_from(["faultline", "serve", "--port", "9000", "--config", "x.yaml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.port, Some(9000)),
            Commands::Report(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn test_report_requires_message() {
        assert!(Cli::try_parse_from(["faultline", "report"]).is_err());
    }
}
