//! Session configuration parsed from environment variables.

use std::path::PathBuf;

use crate::store::DEFAULT_STORAGE_KEY;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:9191/api";
pub const DEFAULT_STORE_PATH: &str = ".authsession/storage.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("config parse failed: {0}")]
    ConfigParse(String),
}

impl ConfigError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBaseUrl(_) => "E_INVALID_BASE_URL",
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// OAuth client credentials sent as HTTP Basic auth to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAuth {
    pub client_id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub client_auth: Option<ClientAuth>,
    pub timeouts: Timeouts,
}

impl ApiConfig {
    /// Config for `base_url` with no client auth and default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] unless the URL is `http(s)://`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self { base_url: normalize_base_url(base_url)?, client_auth: None, timeouts: Timeouts::default() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub api: ApiConfig,
    pub store_path: PathBuf,
    pub storage_key: String,
}

impl SessionConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_API_BASE_URL`: default `http://localhost:9191/api`
    /// - `AUTH_STORE_PATH`: default `.authsession/storage.json`
    /// - `AUTH_STORAGE_KEY`: default `currentUser`
    /// - `AUTH_CLIENT_ID` / `AUTH_CLIENT_SECRET`: Basic auth for the token endpoint
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed base URL, or a client secret without
    /// a client id.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            &std::env::var("AUTH_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
        )?;

        let client_id = env_non_empty("AUTH_CLIENT_ID");
        let client_secret = env_non_empty("AUTH_CLIENT_SECRET");
        let client_auth = match (client_id, client_secret) {
            (Some(client_id), client_secret) => Some(ClientAuth { client_id, client_secret }),
            (None, Some(_)) => {
                return Err(ConfigError::ConfigParse("AUTH_CLIENT_SECRET set without AUTH_CLIENT_ID".into()));
            }
            (None, None) => None,
        };

        let timeouts = Timeouts {
            request_secs: env_parse_u64("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let store_path = env_non_empty("AUTH_STORE_PATH").map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);
        let storage_key = env_non_empty("AUTH_STORAGE_KEY").unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        Ok(Self { api: ApiConfig { base_url, client_auth, timeouts }, store_path, storage_key })
    }
}

/// Trim trailing slashes and require an `http://` or `https://` scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for any other input.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidBaseUrl(raw.to_owned())),
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
