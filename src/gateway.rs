//! Auth gateway: login and profile calls that drive the session.
//!
//! ERROR HANDLING
//! ==============
//! `login` and `update_profile` failures are returned to the caller and leave
//! the session untouched; a failed login never had a token to clear. Only
//! `SessionState::initialize` reacts to a failed profile fetch by clearing.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiError, AuthApi};
use crate::state::SessionState;
use crate::types::{Credentials, ProfileUpdate, Token, User};

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login failed: {0}")]
    LoginFailed(#[source] ApiError),

    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(#[source] ApiError),

    #[error("profile update failed: {0}")]
    ProfileUpdateFailed(#[source] ApiError),
}

impl AuthError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LoginFailed(_) => "E_LOGIN_FAILED",
            Self::ProfileFetchFailed(_) => "E_PROFILE_FETCH_FAILED",
            Self::ProfileUpdateFailed(_) => "E_PROFILE_UPDATE_FAILED",
        }
    }

    /// The underlying API error.
    #[must_use]
    pub fn api_error(&self) -> &ApiError {
        match self {
            Self::LoginFailed(e) | Self::ProfileFetchFailed(e) | Self::ProfileUpdateFailed(e) => e,
        }
    }
}

pub struct AuthGateway {
    api: Arc<dyn AuthApi>,
    session: Arc<SessionState>,
}

impl AuthGateway {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, session: Arc<SessionState>) -> Self {
        Self { api, session }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Exchange credentials for a user and authenticate the session with it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::LoginFailed`] on any transport or rejection error.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let user = self
            .api
            .request_token(credentials)
            .await
            .and_then(require_user)
            .map_err(|e| {
                warn!(error = %e, code = e.error_code(), "login failed");
                AuthError::LoginFailed(e)
            })?;

        self.session.set_authenticated(user.clone());
        info!("login succeeded");
        Ok(user)
    }

    /// Send a partial update for the current user and republish the result.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProfileUpdateFailed`] when no session token is
    /// stored or the API rejects the update.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, AuthError> {
        let user = async {
            let token = self.session.stored_token().ok_or(ApiError::MissingCredential)?;
            let user = self.api.update_profile(&token, update).await?;
            require_user(user)
        }
        .await
        .map_err(|e| {
            warn!(error = %e, code = e.error_code(), "profile update failed");
            AuthError::ProfileUpdateFailed(e)
        })?;

        self.session.set_authenticated(user.clone());
        info!("profile updated");
        Ok(user)
    }

    /// Fetch the profile for the stored token. Does not touch the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProfileFetchFailed`] when no token is stored or the
    /// API rejects it.
    pub async fn fetch_current_profile(&self) -> Result<User, AuthError> {
        let token = self
            .session
            .stored_token()
            .ok_or(AuthError::ProfileFetchFailed(ApiError::MissingCredential))?;
        self.fetch_profile_for(&token).await
    }

    /// Fetch the profile for an explicit token. Does not touch the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProfileFetchFailed`] when the API rejects `token`.
    pub async fn fetch_profile_for(&self, token: &Token) -> Result<User, AuthError> {
        self.api
            .fetch_profile(token)
            .await
            .and_then(require_user)
            .map_err(AuthError::ProfileFetchFailed)
    }

    /// Explicit logout.
    pub fn logout(&self) {
        self.session.clear_authentication();
        info!("logged out");
    }
}

fn require_user(user: User) -> Result<User, ApiError> {
    if user.is_empty() { Err(ApiError::EmptyUser) } else { Ok(user) }
}
