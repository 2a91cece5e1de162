//! Fault domain models.
//!
//! A [`FaultReport`] describes one occurrence of an application error. The
//! fault engine derives a [`FaultFingerprint`] from it, tracks known faults
//! as [`FaultRecord`]s, and answers every report with a [`ReportOutcome`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Free-form key/value data attached to a report, kept in insertion order.
pub type FaultFields = Map<String, Value>;

/// How bad a fault is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Service is down or data is at risk.
    Critical,
    /// A request or job failed.
    Error,
    /// Degraded but working.
    Warning,
}

impl Severity {
    /// Returns the lowercase label used in ticket bodies.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    /// Parse a severity label. Unknown labels yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported occurrence of an application error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultReport {
    /// Human-readable error message.
    pub message: String,
    /// Stack trace or cause chain; its first line is part of the identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Severity label; absent or unrecognized labels use the configured
    /// default priority.
    #[serde(
        default,
        deserialize_with = "lenient_severity",
        skip_serializing_if = "Option::is_none"
    )]
    pub severity: Option<Severity>,
    /// Caller-supplied context (request data, action names, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: FaultFields,
    /// Affected user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// URL being served when the fault happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Arbitrary extra data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: FaultFields,
}

impl FaultReport {
    /// Create a report with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set the stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Add a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the affected user.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// First line of the stack trace, or `""` when there is none.
    pub fn stack_head(&self) -> &str {
        self.stack
            .as_deref()
            .and_then(|s| s.lines().next())
            .unwrap_or("")
    }

    /// Label used in titles and bodies. Reports without a severity read as `error`.
    pub fn severity_label(&self) -> &'static str {
        self.severity.map_or("error", |s| s.as_str())
    }
}

/// Accepts any severity label; ones [`Severity::parse`] does not know become `None`.
fn lenient_severity<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(Severity::parse))
}

/// Stable identity of a fault, derived from message and stack head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaultFingerprint(String);

impl FaultFingerprint {
    /// Wrap an already computed hex digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaultFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fault the cache knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRecord {
    /// Identity of the fault.
    pub fingerprint: FaultFingerprint,
    /// Tracker-internal ticket id.
    pub ticket_id: String,
    /// Human ticket key (e.g. `ENG-42`).
    pub identifier: String,
    /// Link to the ticket.
    pub url: String,
    /// Number of sightings inside the current window, starting at 1.
    pub count: u64,
    /// When the record was created.
    pub first_seen: DateTime<Utc>,
    /// Most recent sighting; the TTL counts from here.
    pub last_seen: DateTime<Utc>,
}

/// Result envelope returned for every successfully handled report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    /// Tracker-internal ticket id.
    pub ticket_id: String,
    /// Human ticket key.
    pub identifier: String,
    /// Link to the ticket.
    pub url: String,
    /// Whether the report matched a known fault.
    pub is_duplicate: bool,
}

impl ReportOutcome {
    /// Outcome pointing at an already tracked fault.
    pub fn duplicate_of(record: &FaultRecord) -> Self {
        Self {
            ticket_id: record.ticket_id.clone(),
            identifier: record.identifier.clone(),
            url: record.url.clone(),
            is_duplicate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse(" ERROR "), Some(Severity::Error));
        assert_eq!(Severity::parse("warn"), Some(Severity::Warning));
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn test_stack_head() {
        let report = FaultReport::new("boom").with_stack("Error: boom\n  at main.rs:1:1");
        assert_eq!(report.stack_head(), "Error: boom");
        assert_eq!(FaultReport::new("boom").stack_head(), "");
    }

    #[test]
    fn test_report_deserializes_with_defaults() {
        let report: FaultReport = serde_json::from_str(
            r#"{"message": "db down", "severity": "critical", "user_id": "u1"}"#,
        )
        .unwrap();
        assert_eq!(report.message, "db down");
        assert_eq!(report.severity, Some(Severity::Critical));
        assert!(report.context.is_empty());
        assert!(report.stack.is_none());
    }

    #[test]
    fn test_unknown_severity_deserializes_as_none() {
        let report: FaultReport =
            serde_json::from_str(r#"{"message": "x", "severity": "fatal"}"#).unwrap();
        assert_eq!(report.severity, None);

        let report: FaultReport =
            serde_json::from_str(r#"{"message": "x", "severity": "Warning"}"#).unwrap();
        assert_eq!(report.severity, Some(Severity::Warning));

        let report: FaultReport =
            serde_json::from_str(r#"{"message": "x", "severity": null}"#).unwrap();
        assert_eq!(report.severity, None);
    }

    #[test]
    fn test_severity_label_defaults_to_error() {
        assert_eq!(FaultReport::new("x").severity_label(), "error");
        assert_eq!(
            FaultReport::new("x")
                .with_severity(Severity::Warning)
                .severity_label(),
            "warning"
        );
    }

    #[test]
    fn test_context_keeps_insertion_order() {
        let report = FaultReport::new("x")
            .with_context("zeta", 1)
            .with_context("alpha", 2);
        let keys: Vec<_> = report.context.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
