//! Linear GraphQL request and response models.
//!
//! These map to the JSON exchanged with `api.linear.app/graphql` and are
//! not part of the public domain model.

use serde::{Deserialize, Serialize};

use crate::domain::models::{CreatedTicket, TicketRequest};

pub(crate) const ISSUE_CREATE_MUTATION: &str = r"
mutation CreateIssue($input: IssueCreateInput!) {
  issueCreate(input: $input) {
    success
    issue { id identifier url }
  }
}";

pub(crate) const COMMENT_CREATE_MUTATION: &str = r"
mutation CreateComment($input: CommentCreateInput!) {
  commentCreate(input: $input) { success }
}";

/// GraphQL request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a, V> {
    /// GraphQL document.
    pub query: &'a str,
    /// Operation variables.
    pub variables: V,
}

/// `{ "input": ... }` variables wrapper used by Linear mutations.
#[derive(Debug, Clone, Serialize)]
pub struct InputVariables<T> {
    /// Mutation input object.
    pub input: T,
}

/// GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    /// Operation result; absent when the request failed.
    pub data: Option<T>,
    /// Errors reported by the API.
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    /// Human-readable error message.
    pub message: String,
}

/// Input of the `issueCreate` mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreateInput {
    /// Team that owns the issue.
    pub team_id: String,
    /// Issue title.
    pub title: String,
    /// Markdown description.
    pub description: String,
    /// 0 = none, 1 = urgent .. 4 = low.
    pub priority: u8,
    /// Labels applied to the issue.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
}

impl From<&TicketRequest> for IssueCreateInput {
    fn from(request: &TicketRequest) -> Self {
        Self {
            team_id: request.team_id.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            priority: request.priority,
            label_ids: request.label_ids.clone(),
        }
    }
}

/// Input of the `commentCreate` mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateInput {
    /// Issue the comment is added to.
    pub issue_id: String,
    /// Markdown comment body.
    pub body: String,
}

/// `data` of an `issueCreate` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreateData {
    /// Mutation payload.
    pub issue_create: IssueCreatePayload,
}

/// Result of `issueCreate`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCreatePayload {
    /// Whether Linear accepted the mutation.
    pub success: bool,
    /// The created issue, when returned.
    #[serde(default)]
    pub issue: Option<LinearIssue>,
}

/// Issue fields selected by the create mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinearIssue {
    /// Linear's internal issue id.
    pub id: String,
    /// Team-scoped key such as `ENG-42`.
    pub identifier: String,
    /// Link to the issue.
    pub url: String,
}

impl From<LinearIssue> for CreatedTicket {
    fn from(issue: LinearIssue) -> Self {
        Self {
            id: issue.id,
            identifier: issue.identifier,
            url: issue.url,
        }
    }
}

/// `data` of a `commentCreate` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateData {
    /// Mutation payload.
    pub comment_create: CommentCreatePayload,
}

/// Result of `commentCreate`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentCreatePayload {
    /// Whether Linear accepted the mutation.
    pub success: bool,
}
