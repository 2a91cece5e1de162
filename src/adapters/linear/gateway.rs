//! [`TrackerGateway`] backed by Linear.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::GatewayError;
use crate::domain::models::{CreatedTicket, TicketRequest};
use crate::domain::ports::TrackerGateway;

use super::client::LinearClient;
use super::models::IssueCreateInput;

/// [`TrackerGateway`] backed by the Linear GraphQL API.
#[derive(Debug, Clone)]
pub struct LinearGateway {
    client: Arc<LinearClient>,
}

impl LinearGateway {
    /// Wrap an existing client.
    pub fn new(client: Arc<LinearClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TrackerGateway for LinearGateway {
    async fn create_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<Option<CreatedTicket>, GatewayError> {
        let issue = self.client.create_issue(IssueCreateInput::from(request)).await?;
        Ok(issue.map(CreatedTicket::from))
    }

    async fn create_comment(&self, ticket_id: &str, body: &str) -> Result<(), GatewayError> {
        self.client.create_comment(ticket_id, body).await
    }
}
