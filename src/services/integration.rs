//! Wiring for the whole integration.
//!
//! [`LinearIntegration`] builds the fault manager, the webhook event
//! registry and the OAuth service from one [`Config`] and exposes the HTTP
//! router that serves them.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;

use crate::adapters::http::{self, AppState};
use crate::adapters::linear::{LinearClient, LinearGateway};
use crate::domain::errors::FaultResult;
use crate::domain::models::Config;
use crate::domain::ports::TrackerGateway;
use crate::services::event_registry::EventRegistry;
use crate::services::fault_manager::FaultManager;
use crate::services::oauth::OAuthService;

/// Fault reporting, webhook routing and OAuth behind one handle.
pub struct LinearIntegration {
    config: Config,
    faults: Option<Arc<FaultManager>>,
    events: Arc<EventRegistry>,
    oauth: Arc<OAuthService>,
}

impl std::fmt::Debug for LinearIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearIntegration")
            .field("faults", &self.faults)
            .field("events", &self.events)
            .field("oauth", &self.oauth)
            .finish_non_exhaustive()
    }
}

impl LinearIntegration {
    /// Build every component from configuration.
    ///
    /// The fault manager is only created when both the API key and the team
    /// id are set; webhooks and OAuth work without it.
    pub fn from_config(config: Config) -> FaultResult<Self> {
        let gateway = if config.linear.is_configured() {
            let client = LinearClient::from_config(&config.linear)?;
            Some(Arc::new(LinearGateway::new(Arc::new(client))) as Arc<dyn TrackerGateway>)
        } else {
            tracing::warn!("Linear API key or team id not set, fault reporting disabled");
            None
        };
        Self::with_gateway(config, gateway)
    }

    /// Build with an explicit tracker gateway (or none).
    pub fn with_gateway(
        config: Config,
        gateway: Option<Arc<dyn TrackerGateway>>,
    ) -> FaultResult<Self> {
        let faults = gateway
            .map(|gateway| FaultManager::from_config(config.faults.clone(), &config.linear, gateway))
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            events: Arc::new(EventRegistry::with_default_handlers()),
            oauth: Arc::new(OAuthService::new(config.oauth.clone())),
            faults,
            config,
        })
    }

    /// Fault manager, if fault reporting is configured.
    pub fn faults(&self) -> Option<&Arc<FaultManager>> {
        self.faults.as_ref()
    }

    /// Whether fault reporting is available.
    pub fn is_configured(&self) -> bool {
        self.faults.is_some()
    }

    /// Webhook handler registry; register handlers before or after serving.
    pub fn webhooks(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    /// OAuth flow.
    pub fn oauth(&self) -> &Arc<OAuthService> {
        &self.oauth
    }

    /// Configuration the integration was built from.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Router serving the webhook and OAuth routes.
    pub fn router(&self) -> Router {
        http::build_router(Arc::new(AppState::new(
            Arc::clone(&self.events),
            Arc::clone(&self.oauth),
            self.config.webhooks.secret.clone(),
        )))
    }

    /// Serve the HTTP routes until `shutdown` resolves.
    pub async fn serve<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        http::serve(self.router(), &self.config.server, shutdown).await
    }
}
