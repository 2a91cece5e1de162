//! Linear GraphQL HTTP client.
//!
//! Posts mutations to the Linear API with the API key in the
//! `Authorization` header (Linear personal keys are sent bare, without a
//! `Bearer` prefix). Transport failures, non-success statuses, GraphQL
//! `errors` and undecodable bodies each map to their own
//! [`GatewayError`] variant.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::{FaultError, FaultResult, GatewayError};
use crate::domain::models::LinearConfig;

use super::models::{
    CommentCreateData, CommentCreateInput, GraphQlRequest, GraphQlResponse, InputVariables,
    IssueCreateData, IssueCreateInput, LinearIssue, COMMENT_CREATE_MUTATION,
    ISSUE_CREATE_MUTATION,
};

/// Public Linear GraphQL endpoint.
pub const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

/// HTTP client for the Linear GraphQL API.
#[derive(Clone)]
pub struct LinearClient {
    http: Client,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for LinearClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl LinearClient {
    /// Create a client for `api_url` (usually [`LINEAR_API_URL`]).
    ///
    /// Fails with [`FaultError::Configuration`] on an empty key.
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> FaultResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FaultError::Configuration(
                "LINEAR_API_KEY is not configured".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("faultline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FaultError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            api_url: api_url.into(),
        })
    }

    /// Build a client from the `linear` config section.
    pub fn from_config(config: &LinearConfig) -> FaultResult<Self> {
        Self::new(
            config.api_key.clone().unwrap_or_default(),
            config.api_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// GraphQL endpoint this client posts to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Execute one GraphQL operation and return its `data`.
    async fn execute<V, T>(&self, operation: &str, query: &str, variables: V) -> Result<T, GatewayError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(&self.api_url)
            .header("Authorization", &self.api_key)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Linear {operation} request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(operation, status = status.as_u16(), "Linear API returned an error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        let envelope: GraphQlResponse<T> = serde_json::from_slice(&body)?;

        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(GatewayError::GraphQl(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| GatewayError::Decode(format!("Linear {operation} response has no data")))
    }

    /// Create an issue. `Ok(None)` when Linear reports success without
    /// returning the issue.
    pub async fn create_issue(
        &self,
        input: IssueCreateInput,
    ) -> Result<Option<LinearIssue>, GatewayError> {
        let data: IssueCreateData = self
            .execute("issueCreate", ISSUE_CREATE_MUTATION, InputVariables { input })
            .await?;

        let payload = data.issue_create;
        if !payload.success {
            return Err(GatewayError::Rejected("issueCreate".to_string()));
        }
        if let Some(issue) = &payload.issue {
            tracing::info!(identifier = %issue.identifier, "Linear issue created");
        }
        Ok(payload.issue)
    }

    /// Add a comment to an issue.
    pub async fn create_comment(&self, issue_id: &str, body: &str) -> Result<(), GatewayError> {
        let input = CommentCreateInput {
            issue_id: issue_id.to_string(),
            body: body.to_string(),
        };
        let data: CommentCreateData = self
            .execute("commentCreate", COMMENT_CREATE_MUTATION, InputVariables { input })
            .await?;

        if !data.comment_create.success {
            return Err(GatewayError::Rejected("commentCreate".to_string()));
        }
        tracing::debug!(issue_id, "Linear comment created");
        Ok(())
    }
}
