//! OAuth routes driven through the axum router, token endpoint mocked.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use faultline::domain::models::{Config, OAuthConfig};
use faultline::LinearIntegration;
use http_body_util::BodyExt;
use reqwest::Url;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn integration(oauth: OAuthConfig) -> LinearIntegration {
    let config = Config {
        oauth,
        ..Config::default()
    };
    LinearIntegration::from_config(config).unwrap()
}

fn oauth_config(token_url: String) -> OAuthConfig {
    OAuthConfig {
        client_id: Some("client-1".to_string()),
        client_secret: Some("secret-1".to_string()),
        redirect_uri: Some("http://localhost:8787/auth/linear/callback".to_string()),
        token_url,
        ..OAuthConfig::default()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start an authorization and return the query of the redirect.
async fn begin(integration: &LinearIntegration) -> HashMap<String, String> {
    let response = integration.router().oneshot(get("/auth/linear")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    Url::parse(location)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

#[tokio::test]
async fn test_begin_redirects_with_pkce() {
    let integration = integration(oauth_config("http://127.0.0.1:9/token".to_string()));
    let query = begin(&integration).await;

    assert_eq!(query["client_id"], "client-1");
    assert_eq!(query["redirect_uri"], "http://localhost:8787/auth/linear/callback");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["code_challenge_method"], "S256");
    assert_eq!(query["code_challenge"].len(), 43);
    assert_eq!(query["state"].len(), 32);
    assert_eq!(integration.oauth().pending().len(), 1);
}

#[tokio::test]
async fn test_begin_without_client_id_is_server_error() {
    let integration = integration(OAuthConfig::default());
    let response = integration.router().oneshot(get("/auth/linear")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_callback_exchanges_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "lin_oauth_abc123",
            "token_type": "Bearer",
            "expires_in": 315_705_599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let integration = integration(oauth_config(format!("{}/oauth/token", server.uri())));
    let query = begin(&integration).await;

    let uri = format!("/auth/linear/callback?code=auth-code-1&state={}", query["state"]);
    let response = integration.router().oneshot(get(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("LINEAR_ACCESS_TOKEN=lin_oauth_abc123"));
    assert!(integration.oauth().pending().is_empty());
}

#[tokio::test]
async fn test_callback_state_is_single_use() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(&server)
        .await;

    let integration = integration(oauth_config(format!("{}/oauth/token", server.uri())));
    let query = begin(&integration).await;
    let uri = format!("/auth/linear/callback?code=c&state={}", query["state"]);

    let first = integration.router().oneshot(get(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let replay = integration.router().oneshot(get(&uri)).await.unwrap();
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejections() {
    let integration = integration(oauth_config("http://127.0.0.1:9/token".to_string()));

    for uri in [
        "/auth/linear/callback?error=access_denied",
        "/auth/linear/callback?code=abc",
        "/auth/linear/callback?code=abc&state=unknown",
    ] {
        let response = integration.router().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_failed_token_exchange_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let integration = integration(oauth_config(format!("{}/oauth/token", server.uri())));
    let query = begin(&integration).await;
    let uri = format!("/auth/linear/callback?code=c&state={}", query["state"]);

    let response = integration.router().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body["detail"].as_str().unwrap().starts_with("Token exchange failed"));
}

#[tokio::test]
async fn test_status_endpoint() {
    let integration = integration(oauth_config("http://127.0.0.1:9/token".to_string()));
    let response = integration.router().oneshot(get("/auth/linear/status")).await.unwrap();

    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        body,
        json!({"configured": true, "redirectUri": "http://localhost:8787/auth/linear/callback"})
    );
}
