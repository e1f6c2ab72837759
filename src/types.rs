//! Session data types: user record, credentials, profile updates, token.
//!
//! DESIGN
//! ======
//! The user record is owned by the account API, so it is kept as an opaque
//! JSON object. The session core only asks two questions of it: is it the
//! empty sentinel, and which bearer credential does it carry.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields consulted, in order, for the bearer credential of a stored user.
const CREDENTIAL_FIELDS: [&str; 2] = ["access_token", "token"];

// =============================================================================
// USER
// =============================================================================

/// Authenticated principal as returned by the account API.
///
/// The empty object is the sentinel for "no user".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(Map<String, Value>);

impl User {
    /// The empty sentinel user.
    #[must_use]
    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value. Returns `None` unless the value is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    /// Bearer credential carried by this record (`access_token`, then `token`).
    #[must_use]
    pub fn bearer_credential(&self) -> Option<&str> {
        CREDENTIAL_FIELDS
            .iter()
            .filter_map(|field| self.0.get(*field).and_then(Value::as_str))
            .find(|value| !value.is_empty())
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for User {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// =============================================================================
// CREDENTIALS / PROFILE UPDATE
// =============================================================================

/// Login credentials sent to the token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Partial user record with the fields to change on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileUpdate(Map<String, Value>);

impl ProfileUpdate {
    /// Wrap a JSON value. Returns `None` unless the value is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }
}

// =============================================================================
// TOKEN
// =============================================================================

/// Opaque persisted session token.
///
/// The session persists the whole serialized user under a single storage key,
/// so the bearer credential is recovered from the blob when one is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Serialize a user record into its persisted form.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self(Value::Object(user.0.clone()).to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Credential to present as `Authorization: Bearer ...`.
    ///
    /// A JSON object blob yields its `access_token`/`token` field; any other
    /// non-empty string is used verbatim.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        match serde_json::from_str::<Value>(&self.0) {
            Ok(Value::Object(map)) => User(map).bearer_credential().map(ToOwned::to_owned),
            _ if self.0.trim().is_empty() => None,
            _ => Some(self.0.clone()),
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Current user and authenticated flag read together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub user: User,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
