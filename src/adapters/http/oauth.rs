//! OAuth routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use serde_json::json;

use crate::services::oauth::{CallbackParams, OAuthError, OAuthStatus};

use super::AppState;

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// `GET /auth/linear`: redirect to Linear's consent screen.
pub async fn begin_oauth(State(state): State<Arc<AppState>>) -> Result<Redirect, OAuthError> {
    let url = state.oauth.begin_authorization()?;
    Ok(Redirect::to(url.as_str()))
}

/// `GET /auth/linear/callback`
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Html<String>, OAuthError> {
    let token = state.oauth.complete_authorization(params).await?;
    Ok(Html(success_page(&token.access_token)))
}

/// `GET /auth/linear/status`
pub async fn oauth_status(State(state): State<Arc<AppState>>) -> Json<OAuthStatus> {
    Json(state.oauth.status())
}

fn success_page(access_token: &str) -> String {
    let token = escape_html(access_token);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Linear Auth Success</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; min-height: 100vh;">
  <div style="text-align: center; max-width: 600px;">
    <h1>Linear Authentication Successful!</h1>
    <p>Access Token:</p>
    <code style="display: block; padding: 1rem; word-break: break-all;">{token}</code>
    <p>Add to your environment: LINEAR_ACCESS_TOKEN={token}</p>
  </div>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_page_escapes_token() {
        let page = success_page("lin_oauth_<x>");
        assert!(page.contains("lin_oauth_&lt;x&gt;"));
        assert!(!page.contains("<x>"));
    }

    #[test]
    fn test_oauth_error_status_codes() {
        assert_eq!(
            OAuthError::InvalidState.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OAuthError::NotConfigured("LINEAR_CLIENT_ID").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            OAuthError::TokenExchange("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
