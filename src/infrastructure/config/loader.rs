//! Layered configuration loading and validation.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::value::{Uncased, UncasedStr};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::services::priority::MAX_PRIORITY;

/// Project config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "faultline.yaml";

/// Optional local overrides, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "faultline.local.yaml";

/// Prefix for nested overrides, e.g. `FAULTLINE_FAULTS__APP_NAME`.
pub const ENV_PREFIX: &str = "FAULTLINE_";

/// Conventional variable names and the config keys they set.
const PLAIN_ENV: &[(&str, &str)] = &[
    ("LINEAR_API_KEY", "linear.api_key"),
    ("LINEAR_DEFAULT_TEAM_ID", "linear.team_id"),
    ("LINEAR_APP_NAME", "faults.app_name"),
    ("ENVIRONMENT", "faults.environment"),
    ("LINEAR_WEBHOOK_SECRET", "webhooks.secret"),
    ("LINEAR_CLIENT_ID", "oauth.client_id"),
    ("LINEAR_CLIENT_SECRET", "oauth.client_secret"),
    ("LINEAR_REDIRECT_URI", "oauth.redirect_uri"),
];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `logging.level` is not a tracing level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// `logging.format` is neither `json` nor `pretty`.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// `logging.rotation` is not a known policy.
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    /// `faults.default_priority` is outside 0..=4.
    #[error("Invalid default_priority: {0}. Must be between 0 and 4")]
    InvalidPriority(u8),

    /// `faults.dedupe_window_ms` is zero.
    #[error("Invalid dedupe_window_ms: must be greater than 0")]
    ZeroDedupeWindow,

    /// `linear.api_url` is empty.
    #[error("Linear api_url cannot be empty")]
    EmptyApiUrl,

    /// `server.port` is zero.
    #[error("Invalid server port: 0")]
    InvalidPort,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. faultline.yaml
    /// 3. faultline.local.yaml (optional)
    /// 4. Plain environment variables (LINEAR_API_KEY, ENVIRONMENT, ...)
    /// 5. FAULTLINE_* environment variables, `__` for nesting
    pub fn load() -> Result<Config> {
        let figment = Self::figment(Path::new(CONFIG_FILE)).merge(Yaml::file(LOCAL_CONFIG_FILE));
        Self::extract(figment)
    }

    /// Load configuration from a specific file, still honouring the
    /// environment layers.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        Self::extract(Self::figment(path))
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .merge(plain_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        if config.faults.default_priority > MAX_PRIORITY {
            return Err(ConfigError::InvalidPriority(config.faults.default_priority));
        }

        if config.faults.dedupe_window_ms == 0 {
            return Err(ConfigError::ZeroDedupeWindow);
        }

        if config.linear.api_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }

        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        Ok(())
    }
}

/// Environment provider for the conventional variable names.
fn plain_env() -> Env {
    let names: Vec<&str> = PLAIN_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(map_plain_key)
}

fn map_plain_key(key: &UncasedStr) -> Uncased<'_> {
    PLAIN_ENV
        .iter()
        .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
        .map_or_else(|| Uncased::from(key.as_str()), |(_, path)| Uncased::from(*path))
}
