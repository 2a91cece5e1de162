//! Markdown rendering of fault reports for Linear tickets.
//!
//! Section order is fixed: details header (with optional URL and user
//! lines), stack trace, context, metadata. Sections for absent or empty
//! fields are omitted.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::models::{FaultFields, FaultReport};

/// Ticket titles carry at most this many characters of the message.
pub const TITLE_MESSAGE_LIMIT: usize = 100;

/// Build the ticket title: `[{app}] {SEVERITY}: {message}`.
pub fn format_title(app_name: &str, report: &FaultReport) -> String {
    format!(
        "[{app_name}] {}: {}",
        report.severity_label().to_uppercase(),
        truncate_chars(&report.message, TITLE_MESSAGE_LIMIT)
    )
}

/// Render the ticket description.
pub fn format_description(report: &FaultReport, environment: &str, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        "## Error Details".to_string(),
        format!("**Message:** {}", report.message),
        format!("**Severity:** {}", report.severity_label()),
        format!("**Environment:** {environment}"),
        format!("**Timestamp:** {}", timestamp(now)),
    ];

    if let Some(url) = &report.url {
        lines.push(format!("**URL:** {url}"));
    }
    if let Some(user_id) = &report.user_id {
        lines.push(format!("**User ID:** {user_id}"));
    }

    if let Some(stack) = report.stack.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(String::new());
        lines.push("## Stack Trace".to_string());
        lines.push("```".to_string());
        lines.push(stack.to_string());
        lines.push("```".to_string());
    }

    push_json_section(&mut lines, "Context", &report.context);
    push_json_section(&mut lines, "Metadata", &report.metadata);

    lines.join("\n")
}

/// Comment appended to an existing ticket when the fault recurs.
pub fn format_recurrence_comment(count: u64, now: DateTime<Utc>) -> String {
    format!("Error occurred again at {}. Count: {count}", timestamp(now))
}

fn push_json_section(lines: &mut Vec<String>, heading: &str, fields: &FaultFields) {
    if fields.is_empty() {
        return;
    }
    // Map<String, Value> always serializes.
    let pretty = serde_json::to_string_pretty(fields).unwrap_or_default();
    lines.push(String::new());
    lines.push(format!("## {heading}"));
    lines.push("```json".to_string());
    lines.push(pretty);
    lines.push("```".to_string());
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
