//! Token storage: a single opaque token under one key of a key-value store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session writes the token on every transition to authenticated and
//! deletes it on every transition to unauthenticated. Stores never inspect
//! token contents.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::types::Token;

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

/// Default storage key, shared with the browser client's local storage.
pub const DEFAULT_STORAGE_KEY: &str = "currentUser";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage file {path} does not hold a JSON object")]
    Format { path: PathBuf },
}

impl StoreError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORE_IO",
            Self::Json(_) => "E_STORE_JSON",
            Self::Format { .. } => "E_STORE_FORMAT",
        }
    }
}

/// Persistent home of the session token.
pub trait TokenStore: Send + Sync {
    /// Fetch the token. Absence is `Ok(None)`, not an error.
    fn read(&self) -> Result<Option<Token>, StoreError>;

    /// Persist the token, overwriting any prior value.
    fn write(&self, token: &Token) -> Result<(), StoreError>;

    /// Remove the token. No-op when absent.
    fn clear(&self) -> Result<(), StoreError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<Token>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: Token) -> Self {
        Self { token: Mutex::new(Some(token)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Result<Option<Token>, StoreError> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn write(&self, token: &Token) -> Result<(), StoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-object file acting as a small key-value store.
///
/// Only `key` is touched; other entries in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self { path: path.into(), key: key.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Format { path: self.path.clone() }),
        }
    }

    /// Replaces the file through a sibling temp file and a rename; readers see
    /// the old object or the new one, never a partial write.
    fn save(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let rendered = serde_json::to_string_pretty(map)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Result<Option<Token>, StoreError> {
        let map = self.load()?;
        Ok(map
            .get(&self.key)
            .and_then(Value::as_str)
            .map(Token::new))
    }

    fn write(&self, token: &Token) -> Result<(), StoreError> {
        let mut map = self.load()?;
        map.insert(self.key.clone(), Value::String(token.as_str().to_owned()));
        self.save(&map)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut map = self.load()?;
        if map.remove(&self.key).is_none() {
            return Ok(());
        }
        self.save(&map)
    }
}
