//! Key-value storage standing in for browser local and session storage.
//!
//! Values are strings, as in the browser. Structured values are stored as
//! JSON through [`read_json`] and [`write_json`].

mod file;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use self::file::JsonFileStore;

/// Well-known storage keys.
pub mod keys {
    /// Local: `"light"` or `"dark"`.
    pub const THEME: &str = "portfolio-theme";
    /// Local: `"true"` once cookies were accepted.
    pub const COOKIES_ACCEPTED: &str = "cookiesAccepted";
    /// Local: JSON list of recent client errors.
    pub const CLIENT_ERRORS: &str = "clientErrors";
    /// Session: JSON context of the last routed error.
    pub const LAST_ERROR: &str = "lastError";
    /// Session: one-shot flag set when an error page redirect happened.
    pub const ERROR_REDIRECTED: &str = "errorRedirected";
    /// Session: client-generated session token.
    pub const SESSION_ID: &str = "secureSessionId";
}

/// Errors from a [`KeyValueStore`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        /// The backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored value is not valid JSON for the requested type.
    #[error("malformed value for key {key}: {source}")]
    Malformed {
        /// The key being read or written.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Malformed {
            key: key.into(),
            source,
        }
    }
}

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A store shared between services.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Reads and deserializes the JSON value under `key`.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    store
        .get(key)?
        .map(|raw| serde_json::from_str(&raw).map_err(|e| StorageError::malformed(key, e)))
        .transpose()
}

/// Serializes `value` as JSON under `key`.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::malformed(key, e))?;
    store.set(key, &raw)
}

/// An in-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basics() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.set(keys::THEME, "dark").unwrap();
        assert_eq!(store.get(keys::THEME).unwrap().as_deref(), Some("dark"));
        store.remove(keys::THEME).unwrap();
        store.remove(keys::THEME).unwrap();
        assert_eq!(store.get(keys::THEME).unwrap(), None);
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        write_json(&store, "list", &vec![1, 2, 3]).unwrap();
        let list: Option<Vec<u32>> = read_json(&store, "list").unwrap();
        assert_eq!(list, Some(vec![1, 2, 3]));

        let missing: Option<Vec<u32>> = read_json(&store, "nothing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let store = MemoryStore::new();
        store.set("list", "{not json").unwrap();
        let err = read_json::<Vec<u32>>(&store, "list").unwrap_err();
        assert!(matches!(err, StorageError::Malformed { ref key, .. } if key == "list"));
    }
}
