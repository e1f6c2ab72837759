//! Account API seam: the three remote calls the session depends on.
//!
//! DESIGN
//! ======
//! `AuthApi` is the only thing `AuthGateway` knows about the network. The
//! `reqwest` implementation lives in `http`; tests substitute a mock.

pub mod http;

use crate::types::{Credentials, ProfileUpdate, Token, User};

pub use http::HttpAuthApi;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by account API calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("API request failed: {0}")]
    Request(String),

    /// The API returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body was not the expected user payload.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The stored token carries no bearer credential.
    #[error("no bearer credential available")]
    MissingCredential,

    /// The API answered with an empty user record.
    #[error("API returned an empty user")]
    EmptyUser,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_API_REQUEST",
            Self::Response { .. } => "E_API_RESPONSE",
            Self::Parse(_) => "E_API_PARSE",
            Self::MissingCredential => "E_MISSING_CREDENTIAL",
            Self::EmptyUser => "E_EMPTY_USER",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether a later identical call could succeed. Nothing here retries;
    /// callers use it to word their messages.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// AUTH API TRAIT
// =============================================================================

/// Provider-neutral async trait for the account API. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for the authenticated user (including its token).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or rejected credentials.
    async fn request_token(&self, credentials: &Credentials) -> Result<User, ApiError>;

    /// Fetch the profile of the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or an invalid token.
    async fn fetch_profile(&self, token: &Token) -> Result<User, ApiError>;

    /// Apply `update` to the user owning `token`, returning the updated user.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a rejected update.
    async fn update_profile(&self, token: &Token, update: &ProfileUpdate) -> Result<User, ApiError>;
}
