//! faultline - Linear fault reporting and webhook relay
//!
//! Turns application faults into Linear issues without flooding the
//! tracker: each distinct fault opens one issue, and repeats within the
//! dedupe window become comments on it. The same crate receives Linear
//! webhooks and runs the OAuth flow for obtaining access tokens.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): fingerprinting, dedup cache, fault
//!   lifecycle, webhook routing, OAuth
//! - **Adapters** (`adapters`): Linear GraphQL client and the axum routes
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use faultline::{ConfigLoader, FaultReport, LinearIntegration, Severity};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let integration = LinearIntegration::from_config(ConfigLoader::load()?)?;
//!     if let Some(faults) = integration.faults() {
//!         let report = FaultReport::new("payment declined").with_severity(Severity::Critical);
//!         let outcome = faults.report(&report).await?;
//!         println!("{} duplicate={}", outcome.identifier, outcome.is_duplicate);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::linear::{LinearClient, LinearGateway};
pub use domain::errors::{FaultError, FaultResult, GatewayError};
pub use domain::models::{
    Config, CreatedTicket, FaultReport, ReportOutcome, Severity, TicketRequest, WebhookPayload,
};
pub use domain::ports::{Clock, SystemClock, TrackerGateway};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ErrorContext, EventRegistry, FaultManager, LinearIntegration, OAuthService, RequestLike,
};
