//! HTTP client for the account API.
//!
//! Thin `reqwest` wrapper over the token, profile, and profile-update
//! endpoints. Pure parsing in `parse_user` / `parse_user_envelope` for
//! testability.

use std::time::Duration;

use serde_json::Value;

use super::{ApiError, AuthApi};
use crate::config::{ApiConfig, ClientAuth};
use crate::types::{Credentials, ProfileUpdate, Token, User};

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

const TOKEN_PATH: &str = "/oauth/token";
const USER_PATH: &str = "/user";
const GRANT_TYPE: &str = "password";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
    client_auth: Option<ClientAuth>,
}

impl HttpAuthApi {
    /// Build a client from typed API config.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), client_auth: config.client_auth.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send `request`, returning the body text of a 2xx response.
    async fn send(request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Response { status: status.as_u16(), body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn request_token(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let request = self
            .http
            .post(self.url(TOKEN_PATH))
            .query(&[
                ("username", credentials.email.as_str()),
                ("password", credentials.password.as_str()),
                ("grant_type", GRANT_TYPE),
            ])
            .json(&TokenRequest { user: credentials });
        let request = match &self.client_auth {
            Some(auth) => request.basic_auth(&auth.client_id, auth.client_secret.as_deref()),
            None => request,
        };

        tracing::debug!(url = %self.url(TOKEN_PATH), "requesting session token");
        let text = Self::send(request).await?;
        parse_user(&text)
    }

    async fn fetch_profile(&self, token: &Token) -> Result<User, ApiError> {
        let bearer = token.bearer().ok_or(ApiError::MissingCredential)?;
        let request = self.http.get(self.url(USER_PATH)).bearer_auth(bearer);

        let text = Self::send(request).await?;
        parse_user_envelope(&text)
    }

    async fn update_profile(&self, token: &Token, update: &ProfileUpdate) -> Result<User, ApiError> {
        let bearer = token.bearer().ok_or(ApiError::MissingCredential)?;
        let request = self
            .http
            .put(self.url(USER_PATH))
            .bearer_auth(bearer)
            .json(&UpdateRequest { user: update });

        let text = Self::send(request).await?;
        parse_user_envelope(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct TokenRequest<'a> {
    user: &'a Credentials,
}

#[derive(serde::Serialize)]
struct UpdateRequest<'a> {
    user: &'a ProfileUpdate,
}

#[derive(serde::Deserialize)]
struct UserEnvelope {
    user: Value,
}

// =============================================================================
// PARSING
// =============================================================================

/// Token endpoint: the body is the user payload itself.
fn parse_user(json: &str) -> Result<User, ApiError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))?;
    User::from_value(value).ok_or_else(|| ApiError::Parse("expected a JSON object".into()))
}

/// Profile endpoints: the user is wrapped as `{"user": {...}}`.
fn parse_user_envelope(json: &str) -> Result<User, ApiError> {
    let envelope: UserEnvelope = serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))?;
    User::from_value(envelope.user).ok_or_else(|| ApiError::Parse("expected `user` to be a JSON object".into()))
}
