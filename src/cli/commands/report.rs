//! Implementation of the `faultline report` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::warn;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, FaultReport, ReportOutcome, Severity};
use crate::services::integration::LinearIntegration;

/// Arguments of `faultline report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Error message
    #[arg(short, long)]
    pub message: String,

    /// Stack trace; its first line takes part in deduplication
    #[arg(short, long)]
    pub stack: Option<String>,

    /// critical, error or warning
    #[arg(long)]
    pub severity: Option<String>,

    /// Affected user
    #[arg(long)]
    pub user_id: Option<String>,

    /// URL where the error happened
    #[arg(long)]
    pub url: Option<String>,

    /// Extra context entries as key=value
    #[arg(short = 'C', long = "context", value_parser = parse_key_value)]
    pub context: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

/// Printed result of `faultline report`.
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    /// Outcome returned by the fault manager.
    #[serde(flatten)]
    pub outcome: ReportOutcome,
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        let verb = if self.outcome.is_duplicate {
            "Recorded recurrence on"
        } else {
            "Created"
        };
        format!("{verb} {} ({})", self.outcome.identifier, self.outcome.url)
    }
}

impl ReportArgs {
    fn into_report(self) -> FaultReport {
        let mut report = FaultReport::new(self.message);
        if let Some(stack) = self.stack {
            report = report.with_stack(stack);
        }
        if let Some(raw) = self.severity {
            match Severity::parse(&raw) {
                Some(severity) => report = report.with_severity(severity),
                None => warn!(severity = %raw, "unknown severity, using default priority"),
            }
        }
        report.user_id = self.user_id;
        report.url = self.url;
        for (key, value) in self.context {
            report = report.with_context(key, value);
        }
        report
    }
}

/// File one fault and print the outcome.
pub async fn execute(args: ReportArgs, config: Config, json_mode: bool) -> Result<()> {
    let report = args.into_report();

    let integration =
        LinearIntegration::from_config(config).context("failed to set up Linear integration")?;
    let faults = integration
        .faults()
        .context("fault reporting is not configured (set LINEAR_API_KEY and LINEAR_DEFAULT_TEAM_ID)")?;

    let outcome = faults.report(&report).await?;
    output(&ReportOutput { outcome }, json_mode);
    Ok(())
}
