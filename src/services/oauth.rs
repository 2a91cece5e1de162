//! Linear OAuth 2.0 authorization-code flow with PKCE.
//!
//! [`OAuthService::begin_authorization`] stores a pending `state` with its
//! PKCE verifier and returns the authorize URL; the callback hands the
//! `state` back to [`OAuthService::complete_authorization`], which consumes
//! the pending entry and exchanges the code for a token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::models::OAuthConfig;
use crate::domain::ports::{Clock, SystemClock};

/// Failures of the OAuth flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// A required OAuth setting is missing.
    #[error("OAuth is not configured: {0} is not set")]
    NotConfigured(&'static str),

    /// Linear redirected back with `error`.
    #[error("Authorization failed: {0}")]
    AuthorizationDenied(String),

    /// The callback lacks `code` or `state`.
    #[error("Missing code or state")]
    MissingParameters,

    /// Unknown or already used `state`.
    #[error("Invalid or expired state")]
    InvalidState,

    /// The pending authorization timed out.
    #[error("Session expired")]
    SessionExpired,

    /// The configured authorize URL does not parse.
    #[error("Invalid authorize URL: {0}")]
    InvalidAuthorizeUrl(String),

    /// The token endpoint refused the exchange.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}

impl OAuthError {
    /// Whether the caller (as opposed to this server) is at fault.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AuthorizationDenied(_)
                | Self::MissingParameters
                | Self::InvalidState
                | Self::SessionExpired
        )
    }
}

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// Secret kept until the callback.
    pub verifier: String,
    /// S256 hash of the verifier sent to Linear.
    pub challenge: String,
}

impl PkcePair {
    /// Fresh pair from 32 random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Derive the challenge for a known verifier.
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

/// Random 16-byte hex `state` value.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone)]
struct PendingAuthorization {
    verifier: String,
    expires_at: DateTime<Utc>,
}

/// Pending authorizations keyed by `state`.
///
/// Expired entries are swept whenever a new one is stored.
#[derive(Debug)]
pub struct PkceStore {
    pending: Mutex<HashMap<String, PendingAuthorization>>,
    ttl: TimeDelta,
}

impl PkceStore {
    /// Store whose entries live for `ttl`.
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Remember `verifier` under `state`, sweeping expired entries.
    pub fn insert(&self, state: String, verifier: String, now: DateTime<Utc>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.insert(
            state,
            PendingAuthorization {
                verifier,
                expires_at: now
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        let before = pending.len();
        pending.retain(|_, entry| entry.expires_at >= now);
        if pending.len() < before {
            debug!(swept = before - pending.len(), "swept expired oauth states");
        }
    }

    /// Remove and return the verifier for `state`.
    pub fn take(&self, state: &str, now: DateTime<Utc>) -> Result<String, OAuthError> {
        let entry = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(state)
            .ok_or(OAuthError::InvalidState)?;
        if entry.expires_at < now {
            return Err(OAuthError::SessionExpired);
        }
        Ok(entry.verifier)
    }

    /// Number of pending authorizations.
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the Linear API.
    pub access_token: String,
    /// Usually `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Configuration summary served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthStatus {
    /// Whether client id and secret are set.
    pub configured: bool,
    /// Configured callback URL.
    pub redirect_uri: Option<String>,
}

/// Callback query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// State issued by `begin_authorization`.
    pub state: Option<String>,
    /// Error code when the user declined.
    pub error: Option<String>,
}

/// Linear OAuth authorization-code flow with PKCE.
pub struct OAuthService {
    config: OAuthConfig,
    http: reqwest::Client,
    store: PkceStore,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for OAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthService")
            .field("client_id", &self.config.client_id)
            .field("redirect_uri", &self.config.redirect_uri)
            .field("pending", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl OAuthService {
    /// Service with a default HTTP client and the system clock.
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_clock(config, reqwest::Client::new(), Arc::new(SystemClock))
    }

    /// Service with an explicit HTTP client and clock.
    pub fn with_clock(config: OAuthConfig, http: reqwest::Client, clock: Arc<dyn Clock>) -> Self {
        let ttl = i64::try_from(config.state_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            config,
            http,
            store: PkceStore::new(ttl),
            clock,
        }
    }

    /// Whether client id and secret are set.
    pub fn is_configured(&self) -> bool {
        self.config.client_id.is_some() && self.config.client_secret.is_some()
    }

    /// Configuration summary for `/auth/linear/status`.
    pub fn status(&self) -> OAuthStatus {
        OAuthStatus {
            configured: self.is_configured(),
            redirect_uri: self.config.redirect_uri.clone(),
        }
    }

    /// Pending authorizations.
    pub const fn pending(&self) -> &PkceStore {
        &self.store
    }

    /// Start an authorization and return the URL to send the user to.
    pub fn begin_authorization(&self) -> Result<Url, OAuthError> {
        let client_id = self
            .config
            .client_id
            .as_deref()
            .ok_or(OAuthError::NotConfigured("LINEAR_CLIENT_ID"))?;

        let pkce = PkcePair::generate();
        let state = generate_state();
        let scope = self.config.scopes.join(",");

        let mut params: Vec<(&str, &str)> = vec![("client_id", client_id)];
        if let Some(redirect_uri) = self.config.redirect_uri.as_deref() {
            params.push(("redirect_uri", redirect_uri));
        }
        params.extend([
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", "S256"),
        ]);

        let url = Url::parse_with_params(&self.config.authorize_url, &params)
            .map_err(|e| OAuthError::InvalidAuthorizeUrl(e.to_string()))?;

        self.store.insert(state, pkce.verifier, self.clock.now());
        debug!(pending = self.store.len(), "oauth authorization started");
        Ok(url)
    }

    /// Finish an authorization from the callback parameters.
    pub async fn complete_authorization(
        &self,
        params: CallbackParams,
    ) -> Result<TokenResponse, OAuthError> {
        if let Some(error) = params.error {
            warn!(error = %error, "oauth authorization denied");
            return Err(OAuthError::AuthorizationDenied(error));
        }
        let (Some(code), Some(state)) = (params.code, params.state) else {
            return Err(OAuthError::MissingParameters);
        };

        let verifier = self.store.take(&state, self.clock.now())?;

        let client_id = self
            .config
            .client_id
            .as_deref()
            .ok_or(OAuthError::NotConfigured("LINEAR_CLIENT_ID"))?;
        let client_secret = self
            .config
            .client_secret
            .as_deref()
            .ok_or(OAuthError::NotConfigured("LINEAR_CLIENT_SECRET"))?;

        let mut form = vec![
            ("code", code.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "authorization_code"),
            ("code_verifier", verifier.as_str()),
        ];
        if let Some(redirect_uri) = self.config.redirect_uri.as_deref() {
            form.push(("redirect_uri", redirect_uri));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "oauth token exchange rejected");
            return Err(OAuthError::TokenExchange(format!("token endpoint returned {status}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;
        info!("oauth authorization completed");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ManualClock;

    fn configured() -> OAuthConfig {
        OAuthConfig {
            client_id: Some("client-1".to_string()),
            client_secret: Some("shh".to_string()),
            redirect_uri: Some("http://localhost:8787/auth/linear/callback".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_pkce_challenge_rfc7636_vector() {
        let pair = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        assert_eq!(pair.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_generated_pkce_shape() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier.len(), 43);
        assert_eq!(pair.challenge.len(), 43);
        assert!(!pair.verifier.contains('='));
        assert_ne!(pair, PkcePair::generate());
    }

    #[test]
    fn test_state_is_32_hex_chars() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_store_take_consumes_entry() {
        let store = PkceStore::new(TimeDelta::minutes(10));
        let now = Utc::now();
        store.insert("s1".to_string(), "v1".to_string(), now);

        assert_eq!(store.take("s1", now).unwrap(), "v1");
        assert!(matches!(store.take("s1", now), Err(OAuthError::InvalidState)));
    }

    #[test]
    fn test_store_expired_entry_is_removed() {
        let store = PkceStore::new(TimeDelta::minutes(10));
        let now = Utc::now();
        store.insert("s1".to_string(), "v1".to_string(), now);

        let later = now + TimeDelta::minutes(11);
        assert!(matches!(store.take("s1", later), Err(OAuthError::SessionExpired)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_sweeps_on_insert() {
        let store = PkceStore::new(TimeDelta::minutes(10));
        let now = Utc::now();
        store.insert("old".to_string(), "v1".to_string(), now);
        store.insert("new".to_string(), "v2".to_string(), now + TimeDelta::minutes(11));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_begin_requires_client_id() {
        let service = OAuthService::new(OAuthConfig::default());
        assert!(matches!(
            service.begin_authorization(),
            Err(OAuthError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_begin_builds_authorize_url() {
        let service = OAuthService::new(configured());
        let url = service.begin_authorization().unwrap();

        assert!(url.as_str().starts_with("https://linear.app/oauth/authorize?"));
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], "read,write,issues:create,comments:create");
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(query["state"].len(), 32);
        assert_eq!(service.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_rejects_error_and_missing_params() {
        let service = OAuthService::new(configured());

        let denied = CallbackParams {
            error: Some("access_denied".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.complete_authorization(denied).await,
            Err(OAuthError::AuthorizationDenied(_))
        ));

        let missing = CallbackParams {
            code: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.complete_authorization(missing).await,
            Err(OAuthError::MissingParameters)
        ));
    }

    #[tokio::test]
    async fn test_complete_rejects_expired_state() {
        let clock = Arc::new(ManualClock::default());
        let service = OAuthService::with_clock(configured(), reqwest::Client::new(), clock.clone());
        let url = service.begin_authorization().unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        clock.advance(TimeDelta::minutes(11));
        let params = CallbackParams {
            code: Some("abc".to_string()),
            state: Some(state),
            error: None,
        };
        let err = service.complete_authorization(params).await.unwrap_err();
        assert!(matches!(err, OAuthError::SessionExpired));
        assert!(err.is_client_error());
        assert!(service.pending().is_empty());
    }
}
