//! Application services.
//!
//! Fault reporting:
//! - [`fingerprint`]: identity of a fault
//! - [`fault_cache`]: fingerprint to ticket memory with a TTL
//! - [`priority`]: severity to tracker priority
//! - [`report_formatter`]: ticket title, body and recurrence comment
//! - [`error_capture`]: reports from errors, panics and requests
//! - [`fault_manager`]: the report lifecycle
//!
//! Inbound:
//! - [`signature`], [`event_registry`]: webhook verification and routing
//! - [`oauth`]: authorization-code flow with PKCE
//!
//! [`integration`] wires everything together.

pub mod error_capture;
pub mod event_registry;
pub mod fault_cache;
pub mod fault_manager;
pub mod fingerprint;
pub mod integration;
pub mod oauth;
pub mod priority;
pub mod report_formatter;
pub mod signature;

pub use error_capture::{ErrorContext, RequestLike, RequestSnapshot};
pub use event_registry::{DispatchSummary, EventRegistry, WebhookHandler};
pub use fault_cache::FaultCache;
pub use fault_manager::{FailurePolicy, FaultManager, TrackerStep};
pub use fingerprint::fingerprint;
pub use integration::LinearIntegration;
pub use oauth::{OAuthError, OAuthService, PkceStore};
pub use priority::priority_for;
pub use report_formatter::{format_description, format_recurrence_comment, format_title};
pub use signature::{compute_signature, verify_signature};
