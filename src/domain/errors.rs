//! Domain errors for the faultline fault reporter.

use thiserror::Error;

/// Failure talking to the issue tracker.
///
/// Raised by [`TrackerGateway`](crate::domain::ports::TrackerGateway)
/// implementations. Nothing in the fault engine retries these; callers
/// resubmit the report if they want another attempt.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never got a response.
    #[error("Tracker request failed: {0}")]
    Network(String),

    /// The tracker answered with a non-success HTTP status.
    #[error("Tracker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The tracker returned GraphQL errors.
    #[error("Tracker GraphQL error: {0}")]
    GraphQl(String),

    /// The response body could not be decoded.
    #[error("Tracker response could not be decoded: {0}")]
    Decode(String),

    /// The tracker answered `success: false`.
    #[error("Tracker rejected the request: {0}")]
    Rejected(String),

    /// Creation succeeded but no ticket came back.
    #[error("Tracker reported success but returned no ticket")]
    MissingTicket,
}

/// Errors surfaced by the fault lifecycle controller.
#[derive(Debug, Error)]
pub enum FaultError {
    /// A required credential or identifier is absent.
    #[error("Fault reporter is not configured: {0}")]
    Configuration(String),

    /// Ticket creation failed on the fresh-ticket path.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Result alias for fault reporting.
pub type FaultResult<T> = Result<T, FaultError>;

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}
