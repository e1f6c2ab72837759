//! Client-side authentication session management.
//!
//! ARCHITECTURE
//! ============
//! `store` persists the opaque session token, `state` owns the reactive
//! session (current user and authenticated flag), and `gateway` talks to the
//! account API through the `api::AuthApi` seam and feeds results back into
//! the session.
//!
//! ```text
//! AuthGateway ── AuthApi (HTTP) ──▶ account API
//!      │
//!      ▼
//! SessionState ──▶ TokenStore
//!      │
//!      ├── current_user      (distinct)
//!      └── is_authenticated  (replay latest)
//! ```

pub mod api;
pub mod config;
pub mod gateway;
pub mod observable;
pub mod state;
pub mod store;
pub mod types;

pub use api::{ApiError, AuthApi, HttpAuthApi};
pub use config::{ApiConfig, ConfigError, SessionConfig};
pub use gateway::{AuthError, AuthGateway};
pub use observable::{Subject, Subscription};
pub use state::SessionState;
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
pub use types::{Credentials, ProfileUpdate, SessionSnapshot, Token, User};
