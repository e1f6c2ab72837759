//! Session state: who is logged in, published to subscribers.
//!
//! DESIGN
//! ======
//! `SessionState` is constructed once per application and shared as an
//! `Arc`. It owns the token store and two subjects:
//!
//! - `current_user`: starts at the empty sentinel, distinct per subscriber.
//! - `is_authenticated`: no value until the first transition, then replayed
//!   to every new subscriber.
//!
//! Both subjects, and the token store, are only written while holding the
//! `transitions` lock, so transitions are applied in call order and a
//! snapshot never sees one field updated without the other.
//!
//! CONCURRENCY
//! ===========
//! `initialize` awaits a profile fetch without holding the lock. A login that
//! completes while that fetch is in flight is overwritten if the fetch
//! completes later: the last completed transition wins, on the subjects and
//! in the store. The store is put back to the token the fetch validated, so
//! the published user and the persisted credential always belong together.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::gateway::AuthGateway;
use crate::observable::{Subject, Subscription};
use crate::store::TokenStore;
use crate::types::{SessionSnapshot, Token, User};

/// How a transition to authenticated updates the token store.
enum Persist<'a> {
    /// Write the serialized user.
    FromUser,
    /// The store must hold this token, which the server just accepted.
    Validated(&'a Token),
}

pub struct SessionState {
    store: Arc<dyn TokenStore>,
    current_user: Subject<User>,
    is_authenticated: Subject<bool>,
    transitions: Mutex<()>,
}

impl SessionState {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            current_user: Subject::with_initial(User::empty()).distinct_until_changed(),
            is_authenticated: Subject::new().replay_last(),
            transitions: Mutex::new(()),
        }
    }

    // =========================================================================
    // STARTUP
    // =========================================================================

    /// Re-validate a stored session with the server. Runs once at startup.
    ///
    /// A rejected token is cleared; no error reaches the caller.
    pub async fn initialize(&self, gateway: &AuthGateway) {
        let Some(token) = self.stored_token() else {
            debug!("no stored session token");
            self.clear_authentication();
            return;
        };

        match gateway.fetch_profile_for(&token).await {
            Ok(user) => {
                info!("stored session token accepted");
                self.apply_authenticated(user, Persist::Validated(&token));
            }
            Err(e) => {
                warn!(error = %e, "stored session token rejected; clearing session");
                self.clear_authentication();
            }
        }
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Enter (or re-enter) the authenticated state with `user`.
    ///
    /// An empty user cannot be authenticated; it clears the session instead.
    pub fn set_authenticated(&self, user: User) {
        self.apply_authenticated(user, Persist::FromUser);
    }

    /// Leave the authenticated state. Idempotent.
    pub fn clear_authentication(&self) {
        let _guard = self.lock();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, code = e.error_code(), "failed to clear session token");
        }
        self.current_user.publish(User::empty());
        self.is_authenticated.publish(false);
        debug!("session cleared");
    }

    fn apply_authenticated(&self, user: User, persist: Persist<'_>) {
        if user.is_empty() {
            warn!("refusing to authenticate an empty user; clearing session");
            self.clear_authentication();
            return;
        }

        let _guard = self.lock();
        let write = match persist {
            Persist::FromUser => Some(Token::from_user(&user)),
            // Another transition replaced the token while the profile was in flight.
            Persist::Validated(token) if self.stored_token().as_ref() != Some(token) => {
                debug!("session token changed during validation; restoring validated token");
                Some(token.clone())
            }
            Persist::Validated(_) => None,
        };
        if let Some(token) = write {
            if let Err(e) = self.store.write(&token) {
                warn!(error = %e, code = e.error_code(), "failed to persist session token");
            }
        }
        self.current_user.publish(user);
        self.is_authenticated.publish(true);
        debug!("session authenticated");
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Latest published user; the empty sentinel when unauthenticated.
    #[must_use]
    pub fn current_user_snapshot(&self) -> User {
        self.current_user.latest().unwrap_or_default()
    }

    /// Latest published flag; `None` before the first transition.
    #[must_use]
    pub fn is_authenticated_snapshot(&self) -> Option<bool> {
        self.is_authenticated.latest()
    }

    /// User and flag read under the transition lock.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let _guard = self.lock();
        SessionSnapshot {
            authenticated: self.is_authenticated.latest().unwrap_or(false),
            user: self.current_user.latest().unwrap_or_default(),
        }
    }

    /// Token currently held by the store. Storage errors read as absent.
    #[must_use]
    pub fn stored_token(&self) -> Option<Token> {
        match self.store.read() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "failed to read session token");
                None
            }
        }
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Stream of distinct current-user values.
    pub fn subscribe_current_user(&self) -> Subscription<User> {
        self.current_user.subscribe()
    }

    /// Stream of the authenticated flag, starting with the latest value.
    pub fn subscribe_is_authenticated(&self) -> Subscription<bool> {
        self.is_authenticated.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
