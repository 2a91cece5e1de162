//! Domain models: fault reports, tickets, webhook payloads and configuration.

pub mod config;
pub mod fault;
pub mod ticket;
pub mod webhook;

pub use config::{
    Config, FaultsConfig, LinearConfig, LoggingConfig, OAuthConfig, ServerConfig, WebhookConfig,
};
pub use fault::{
    FaultFields, FaultFingerprint, FaultRecord, FaultReport, ReportOutcome, Severity,
};
pub use ticket::{CreatedTicket, TicketRequest};
pub use webhook::WebhookPayload;
