//! Ticket models exchanged with the tracker gateway.

use serde::{Deserialize, Serialize};

/// Everything needed to open a new ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    /// Team that owns the ticket.
    pub team_id: String,
    /// Ticket title.
    pub title: String,
    /// Markdown body.
    pub description: String,
    /// Tracker priority level (1 = urgent ... 4 = low, 0 = none).
    pub priority: u8,
    /// Labels applied to the ticket.
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// A ticket the tracker confirmed it created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTicket {
    /// Tracker-internal id.
    pub id: String,
    /// Human ticket key (e.g. `ENG-42`).
    pub identifier: String,
    /// Link to the ticket.
    pub url: String,
}
