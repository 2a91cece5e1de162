//! HTTP surface: Linear webhook receiver and OAuth routes.
//!
//! | Method | Path                      | Handler                         |
//! |--------|---------------------------|---------------------------------|
//! | POST   | `/webhooks/linear`        | verify, parse, dispatch         |
//! | GET    | `/webhooks/linear/health` | webhook configuration status    |
//! | GET    | `/auth/linear`            | start OAuth (303 to Linear)     |
//! | GET    | `/auth/linear/callback`   | finish OAuth, show access token |
//! | GET    | `/auth/linear/status`     | OAuth configuration status      |

pub mod oauth;
pub mod webhook;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::domain::models::ServerConfig;
use crate::services::event_registry::EventRegistry;
use crate::services::oauth::OAuthService;

pub use oauth::{begin_oauth, oauth_callback, oauth_status};
pub use webhook::{receive_webhook, webhook_health, WebhookError};

/// Shared state for the HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// Registry that receives verified webhook events.
    pub events: Arc<EventRegistry>,
    /// OAuth flow backing the `/auth/linear` routes.
    pub oauth: Arc<OAuthService>,
    /// Shared secret for `linear-signature`; `None` skips verification.
    pub webhook_secret: Option<String>,
}

impl AppState {
    /// Bundle the route dependencies. An empty secret counts as unset.
    pub fn new(
        events: Arc<EventRegistry>,
        oauth: Arc<OAuthService>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            events,
            oauth,
            webhook_secret: webhook_secret.filter(|s| !s.is_empty()),
        }
    }
}

/// Build the router with all endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/linear", post(receive_webhook))
        .route("/webhooks/linear/health", get(webhook_health))
        .route("/auth/linear", get(begin_oauth))
        .route("/auth/linear/callback", get(oauth_callback))
        .route("/auth/linear/status", get(oauth_status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` until `shutdown` resolves.
pub async fn serve<F>(router: Router, config: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
