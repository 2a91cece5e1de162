//! Linear webhook receiver.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::domain::models::WebhookPayload;
use crate::services::signature::{verify_signature, SIGNATURE_HEADER};

use super::AppState;

/// Errors that reject a delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The `linear-signature` header is missing or does not match.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// The body is not a valid webhook payload.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Body of `GET /webhooks/linear/health`.
#[derive(Debug, Serialize)]
pub struct WebhookHealth {
    /// Always `ok`.
    pub status: &'static str,
    /// Whether a signing secret is configured.
    pub configured: bool,
    /// RFC 3339 time of the check.
    pub timestamp: String,
}

/// `POST /webhooks/linear`
///
/// The signature is checked against the raw body before parsing.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if !verify_signature(&body, signature, state.webhook_secret.as_deref()) {
        tracing::warn!("rejected webhook with invalid signature");
        return Err(WebhookError::InvalidSignature);
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

    tracing::info!(
        event = %payload.event_key(),
        webhook_id = %payload.webhook_id,
        "linear webhook received"
    );

    let summary = state.events.dispatch(&payload).await;
    if summary.failed > 0 {
        tracing::warn!(
            event = %payload.event_key(),
            failed = summary.failed,
            invoked = summary.invoked,
            "some webhook handlers failed"
        );
    }

    Ok(Json(json!({ "success": true })))
}

/// `GET /webhooks/linear/health`
pub async fn webhook_health(State(state): State<Arc<AppState>>) -> Json<WebhookHealth> {
    Json(WebhookHealth {
        status: "ok",
        configured: state.webhook_secret.is_some(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
