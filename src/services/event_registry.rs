//! Webhook event routing.
//!
//! Handlers subscribe by key:
//!
//! - `Issue.create`: one action on one entity type
//! - `Issue` or `Issue.*`: every action on an entity type
//! - `*`: every delivery
//!
//! A delivery runs every matching handler concurrently. A failing or
//! panicking handler is logged and counted; it never stops its siblings.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::WebhookPayload;

/// Global wildcard key.
pub const ANY_EVENT: &str = "*";

/// Receiver for webhook deliveries.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Process one event.
    async fn handle(&self, payload: &WebhookPayload) -> Result<()>;
}

#[async_trait]
impl<F, Fut> WebhookHandler for F
where
    F: Fn(WebhookPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, payload: &WebhookPayload) -> Result<()> {
        (self)(payload.clone()).await
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Handlers that ran.
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// Handler table keyed by event pattern.
#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn WebhookHandler>>>>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// `Issue` and `Issue.*` name the same subscription.
fn normalize_key(key: &str) -> String {
    let key = key.trim();
    if key == ANY_EVENT || key.contains('.') {
        key.to_string()
    } else {
        format!("{key}.*")
    }
}

impl EventRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the logging handlers for issue creation and
    /// completion.
    pub fn with_default_handlers() -> Self {
        let registry = Self::new();
        registry.on("Issue.create", log_issue_created);
        registry.on("Issue.update", log_issue_completed);
        registry
    }

    /// Subscribe `handler` to `key`.
    pub fn on<H>(&self, key: &str, handler: H)
    where
        H: WebhookHandler + 'static,
    {
        self.on_arc(key, Arc::new(handler));
    }

    /// Register an already shared handler.
    pub fn on_arc(&self, key: &str, handler: Arc<dyn WebhookHandler>) {
        let key = normalize_key(key);
        debug!(key = %key, "registering webhook handler");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .push(handler);
    }

    /// Total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    fn matching(&self, payload: &WebhookPayload) -> Vec<Arc<dyn WebhookHandler>> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        [
            payload.event_key(),
            format!("{}.*", payload.entity_type),
            ANY_EVENT.to_string(),
        ]
        .iter()
        .filter_map(|key| handlers.get(key))
        .flatten()
        .cloned()
        .collect()
    }

    /// Run every handler matching the delivery.
    #[instrument(skip(self, payload), fields(event = %payload.event_key()))]
    pub async fn dispatch(&self, payload: &WebhookPayload) -> DispatchSummary {
        let handlers = self.matching(payload);
        if handlers.is_empty() {
            debug!("no handlers for webhook event");
            return DispatchSummary::default();
        }

        let results = join_all(
            handlers
                .iter()
                .map(|handler| AssertUnwindSafe(handler.handle(payload)).catch_unwind()),
        )
        .await;

        let mut summary = DispatchSummary {
            invoked: results.len(),
            failed: 0,
        };
        for result in results {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    summary.failed += 1;
                    warn!(error = %err, "webhook handler failed");
                }
                Err(_) => {
                    summary.failed += 1;
                    warn!("webhook handler panicked");
                }
            }
        }

        debug!(
            invoked = summary.invoked,
            failed = summary.failed,
            "webhook event dispatched"
        );
        summary
    }
}

async fn log_issue_created(payload: WebhookPayload) -> Result<()> {
    info!(
        identifier = payload.data_str("identifier").unwrap_or_default(),
        title = payload.data_str("title").unwrap_or_default(),
        "linear issue created"
    );
    Ok(())
}

async fn log_issue_completed(payload: WebhookPayload) -> Result<()> {
    let state_type = payload
        .data
        .get("state")
        .and_then(|state| state.get("type"))
        .and_then(serde_json::Value::as_str);
    if state_type == Some("completed") {
        info!(
            identifier = payload.data_str("identifier").unwrap_or_default(),
            "linear issue completed"
        );
    }
    Ok(())
}
