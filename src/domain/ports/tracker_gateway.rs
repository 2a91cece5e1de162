//! Tracker gateway port.
//!
//! The fault engine reaches the issue tracker exclusively through this
//! trait, so the Linear adapter can be swapped for an in-memory fake in
//! tests.

use async_trait::async_trait;

use crate::domain::errors::GatewayError;
use crate::domain::models::{CreatedTicket, TicketRequest};

/// Ticket and comment creation against an external issue tracker.
#[async_trait]
pub trait TrackerGateway: Send + Sync {
    /// Open a new ticket.
    ///
    /// `Ok(None)` means the tracker answered successfully but did not
    /// return the created entity; the caller decides how to treat that.
    async fn create_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<Option<CreatedTicket>, GatewayError>;

    /// Append a comment to an existing ticket.
    async fn create_comment(&self, ticket_id: &str, body: &str) -> Result<(), GatewayError>;
}
