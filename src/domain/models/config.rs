//! Application configuration sections.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for faultline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Linear API access
    #[serde(default)]
    pub linear: LinearConfig,

    /// Fault reporting behaviour
    #[serde(default)]
    pub faults: FaultsConfig,

    /// Inbound webhook settings
    #[serde(default)]
    pub webhooks: WebhookConfig,

    /// OAuth application settings
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// HTTP listener for webhook and OAuth routes
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Linear API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinearConfig {
    /// API key or OAuth access token
    #[serde(default)]
    pub api_key: Option<String>,

    /// GraphQL endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Team that receives fault tickets
    #[serde(default)]
    pub team_id: Option<String>,

    /// Labels attached to every fault ticket
    #[serde(default)]
    pub label_ids: Vec<String>,

    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.linear.app/graphql".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            team_id: None,
            label_ids: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LinearConfig {
    /// Whether both the credential and the team id are present and non-empty.
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.api_key) && present(&self.team_id)
    }
}

/// Fault reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FaultsConfig {
    /// Application name shown in ticket titles
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Environment label shown in ticket bodies
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Priority used when a report carries no known severity (0-4)
    #[serde(default = "default_priority")]
    pub default_priority: u8,

    /// Whether repeated faults are folded into the existing ticket
    #[serde(default = "default_true")]
    pub dedupe_enabled: bool,

    /// How long a fault stays "already tracked" after its last sighting
    #[serde(default = "default_dedupe_window_ms")]
    pub dedupe_window_ms: u64,
}

fn default_app_name() -> String {
    "Application".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

const fn default_priority() -> u8 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_dedupe_window_ms() -> u64 {
    60 * 60 * 1000
}

impl Default for FaultsConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            environment: default_environment(),
            default_priority: default_priority(),
            dedupe_enabled: default_true(),
            dedupe_window_ms: default_dedupe_window_ms(),
        }
    }
}

impl FaultsConfig {
    /// The dedupe window as a chrono duration, saturating on overflow.
    pub fn dedupe_window(&self) -> TimeDelta {
        i64::try_from(self.dedupe_window_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

/// Webhook configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookConfig {
    /// Shared signing secret; unsigned deliveries are accepted when absent
    #[serde(default)]
    pub secret: Option<String>,
}

/// OAuth application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OAuthConfig {
    /// OAuth application client id.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth application client secret.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Callback URL registered with Linear.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Linear authorization page.
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Linear token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Requested scopes, joined with commas.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Lifetime of a pending authorization (state + PKCE verifier)
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
}

fn default_authorize_url() -> String {
    "https://linear.app/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://api.linear.app/oauth/token".to_string()
}

fn default_scopes() -> Vec<String> {
    ["read", "write", "issues:create", "comments:create"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_state_ttl_secs() -> u64 {
    600
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            scopes: default_scopes(),
            state_ttl_secs: default_state_ttl_secs(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file logs: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
