//! Conversions from errors, panics and requests into [`FaultReport`]s.
//!
//! The generated stack mimics a conventional trace: the first line is
//! `{type}: {message}` (the deduplication identity), followed by the
//! capture location and the `source()` chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::Write as _;
use std::panic::{Location, PanicHookInfo};

use crate::domain::models::{FaultFields, FaultReport, Severity};

/// Optional details attached to an error report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Affected user.
    pub user_id: Option<String>,
    /// URL being served.
    pub url: Option<String>,
    /// What the application was doing; stored under `context.action`.
    pub action: Option<String>,
    /// Extra data copied into the report metadata.
    #[serde(default)]
    pub metadata: FaultFields,
}

impl ErrorContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
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

    /// Set the action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Anything that looks like an inbound request.
///
/// Lets the fault reporter attach request details without depending on a
/// particular HTTP framework. `http::Request<B>` forwards its body when `B`
/// is serializable; streamed bodies are not buffered, so report those via
/// [`RequestSnapshot::with_body`] or the request `Parts`.
pub trait RequestLike {
    /// Request target, path and query.
    fn url(&self) -> String;
    /// HTTP method name.
    fn method(&self) -> String;
    /// Request body, when the caller has it buffered.
    fn body(&self) -> Option<Value> {
        None
    }
}

/// Owned copy of the request details worth reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Request target.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Buffered body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestSnapshot {
    /// Snapshot without a body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            body: None,
        }
    }

    /// Attach a body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl RequestLike for RequestSnapshot {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn method(&self) -> String {
        self.method.clone()
    }

    fn body(&self) -> Option<Value> {
        self.body.clone()
    }
}

impl RequestLike for axum::http::request::Parts {
    fn url(&self) -> String {
        self.uri.to_string()
    }

    fn method(&self) -> String {
        self.method.to_string()
    }
}

impl<B: Serialize> RequestLike for axum::http::Request<B> {
    fn url(&self) -> String {
        self.uri().to_string()
    }

    fn method(&self) -> String {
        self.method().to_string()
    }

    fn body(&self) -> Option<Value> {
        serde_json::to_value(self.body())
            .ok()
            .filter(|body| !body.is_null())
    }
}

/// Build a report from an error value. Severity is always `error`.
pub fn error_report<E>(error: &E, context: ErrorContext, location: &Location<'_>) -> FaultReport
where
    E: Error + ?Sized,
{
    let message = error.to_string();
    let mut stack = format!(
        "{}: {message}\n  at {}:{}:{}",
        short_type_name::<E>(),
        location.file(),
        location.line(),
        location.column()
    );
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(stack, "\n  caused by: {cause}");
        source = cause.source();
    }

    let mut report = FaultReport::new(message)
        .with_stack(stack)
        .with_severity(Severity::Error);
    if let Some(action) = context.action {
        report = report.with_context("action", action);
    }
    report.user_id = context.user_id;
    report.url = context.url;
    report.metadata = context.metadata;
    report
}

/// Build a report from an error raised while serving `request`.
pub fn request_report<E, R>(error: &E, request: &R, location: &Location<'_>) -> FaultReport
where
    E: Error + ?Sized,
    R: RequestLike + ?Sized,
{
    let url = request.url();
    let mut report = error_report(error, ErrorContext::new().with_url(url.clone()), location)
        .with_context("url", url)
        .with_context("method", request.method());
    if let Some(body) = request.body() {
        report = report.with_context("body", body);
    }
    report
}

/// Build a critical report from a panic.
pub fn panic_report(info: &PanicHookInfo<'_>) -> FaultReport {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string());

    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>").to_string();

    let mut stack = format!("panic: {message}");
    if let Some(location) = info.location() {
        let _ = write!(
            stack,
            "\n  at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }

    FaultReport::new(message)
        .with_stack(stack)
        .with_severity(Severity::Critical)
        .with_context("thread", thread_name)
}

/// Last path segment of a type name (`std::io::Error` → `Error`).
/// Trait objects read as plain `Error`.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.starts_with("dyn ") {
        return "Error";
    }
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fingerprint::fingerprint;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failed to load invoice")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    fn outer() -> Outer {
        Outer(std::io::Error::new(std::io::ErrorKind::NotFound, "invoice.json missing"))
    }

    #[test]
    fn test_error_report_builds_stack_from_sources() {
        let report = error_report(&outer(), ErrorContext::new(), Location::caller());
        assert_eq!(report.message, "failed to load invoice");
        assert_eq!(report.severity, Some(Severity::Error));

        let stack = report.stack.unwrap();
        let lines: Vec<&str> = stack.lines().collect();
        assert_eq!(lines[0], "Outer: failed to load invoice");
        assert!(lines[1].starts_with("  at src/services/error_capture.rs:"));
        assert_eq!(lines[2], "  caused by: invoice.json missing");
    }

    #[test]
    fn test_error_report_applies_context() {
        let context = ErrorContext::new()
            .with_user_id("user_123")
            .with_url("/api/invoices")
            .with_action("load_invoice")
            .with_metadata("invoice", 42);
        let report = error_report(&outer(), context, Location::caller());

        assert_eq!(report.user_id.as_deref(), Some("user_123"));
        assert_eq!(report.url.as_deref(), Some("/api/invoices"));
        assert_eq!(report.context["action"], "load_invoice");
        assert_eq!(report.metadata["invoice"], 42);
    }

    #[test]
    fn test_same_error_from_different_lines_shares_fingerprint() {
        let a = error_report(&outer(), ErrorContext::new(), Location::caller());
        let b = error_report(&outer(), ErrorContext::new(), Location::caller());
        assert_ne!(a.stack, b.stack);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_dyn_error_is_accepted() {
        let boxed: Box<dyn Error + Send + Sync> = "plain failure".into();
        let report = error_report(boxed.as_ref(), ErrorContext::new(), Location::caller());
        assert_eq!(report.message, "plain failure");
        assert!(report.stack.unwrap().starts_with("Error: plain failure"));
    }

    #[test]
    fn test_request_report_forwards_request_details() {
        let request = RequestSnapshot::new("POST", "/api/orders")
            .with_body(serde_json::json!({"sku": "A-1"}));
        let report = request_report(&outer(), &request, Location::caller());

        assert_eq!(report.url.as_deref(), Some("/api/orders"));
        assert_eq!(report.context["url"], "/api/orders");
        assert_eq!(report.context["method"], "POST");
        assert_eq!(report.context["body"]["sku"], "A-1");
    }

    #[test]
    fn test_http_parts_are_request_like() {
        let (parts, ()) = axum::http::Request::builder()
            .method("DELETE")
            .uri("/api/orders/7?force=true")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(RequestLike::url(&parts), "/api/orders/7?force=true");
        assert_eq!(RequestLike::method(&parts), "DELETE");
        assert!(RequestLike::body(&parts).is_none());
    }

    #[test]
    fn test_http_request_forwards_serializable_body() {
        let request = axum::http::Request::builder()
            .method("PUT")
            .uri("/api/carts/3")
            .body(serde_json::json!({"items": 2}))
            .unwrap();
        let report = request_report(&outer(), &request, Location::caller());
        assert_eq!(report.context["method"], "PUT");
        assert_eq!(report.context["body"]["items"], 2);

        let empty = axum::http::Request::builder().uri("/ping").body(()).unwrap();
        assert!(RequestLike::body(&empty).is_none());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<Outer>(), "Outer");
    }
}
