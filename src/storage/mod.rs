//! Local key/value persistence
//!
//! Every persisted document (the current user, the whole chat history
//! collection) is one JSON string stored under a fixed key. Writes always
//! replace the full document in a single operation, so readers never observe
//! a partially written collection.

use crate::error::{CemtrasError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub mod types;
pub use types::{ChatHistoryRecord, HistorySummary};

/// Key holding the signed-in user record
pub const CURRENT_USER_KEY: &str = "cemtras_current_user";

/// Key holding the full chat history collection
pub const CHAT_HISTORY_KEY: &str = "cemtras_chat_history";

/// Minimal string key/value store
///
/// Implementations must make `set` atomic per key.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and deserialize a JSON document
///
/// # Errors
///
/// Returns `CemtrasError::Storage` if the stored value is not valid JSON for `T`
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to deserialize '{}'", key))
                .map_err(|e| CemtrasError::Storage(format!("{:#}", e)))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serialize a value to JSON and store it under `key` in one write
pub fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize '{}'", key))
        .map_err(|e| CemtrasError::Storage(format!("{:#}", e)))?;
    store.set(key, &raw)
}

/// Durable store backed by an embedded `sled` database
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Open the store in the user's data directory
    ///
    /// # Errors
    ///
    /// Returns `CemtrasError::Storage` if the data directory cannot be
    /// determined or the database cannot be opened
    pub fn open_default() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "cemtras", "cemtras")
            .ok_or_else(|| CemtrasError::Storage("Could not determine data directory".into()))?;
        Self::new_with_path(proj_dirs.data_dir().join("store"))
    }

    /// Open the store at `path` when given, otherwise in the data directory
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::new_with_path(p),
            None => Self::open_default(),
        }
    }

    /// Open (or create) the store at `path`
    ///
    /// # Examples
    ///
    /// ```
    /// use cemtras::storage::{KeyValueStore, SledStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledStore::new_with_path(dir.path().join("store")).unwrap();
    /// store.set("k", "v").unwrap();
    /// assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for store")
                .map_err(|e| CemtrasError::Storage(format!("{:#}", e)))?;
        }

        let db = sled::open(&path)
            .with_context(|| format!("Failed to open store at {}", path.display()))
            .map_err(|e| CemtrasError::Storage(format!("{:#}", e)))?;

        tracing::debug!("Opened sled store at {}", path.display());
        Ok(Self { db, path })
    }

    /// Location of the database on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.db.get(key).map_err(CemtrasError::from)?;
        match value {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    CemtrasError::Storage(format!("Value for '{}' is not UTF-8: {}", key, e))
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key, value.as_bytes())
            .map_err(CemtrasError::from)?;
        self.db.flush().map_err(CemtrasError::from)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key).map_err(CemtrasError::from)?;
        self.db.flush().map_err(CemtrasError::from)?;
        Ok(())
    }
}

/// Volatile in-process store
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CemtrasError::Storage("Failed to acquire read lock".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CemtrasError::Storage("Failed to acquire write lock".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CemtrasError::Storage("Failed to acquire write lock".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    fn create_test_store() -> (SledStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let store = SledStore::new_with_path(dir.path().join("store")).expect("open store");
        (store, dir)
    }

    #[test]
    fn test_sled_get_missing_key_is_none() {
        let (store, _dir) = create_test_store();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_sled_set_overwrites() {
        let (store, _dir) = create_test_store();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_sled_remove_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_sled_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store");
        {
            let store = SledStore::new_with_path(&path).unwrap();
            store.set(CURRENT_USER_KEY, "{\"a\":1}").unwrap();
        }
        let reopened = SledStore::new_with_path(&path).unwrap();
        assert_eq!(
            reopened.get(CURRENT_USER_KEY).unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_json_helpers_round_trip() {
        let store = MemoryStore::new();
        let doc = Doc {
            name: "kiln".to_string(),
            count: 3,
        };
        write_json(&store, "doc", &doc).unwrap();
        let loaded: Option<Doc> = read_json(&store, "doc").unwrap();
        assert_eq!(loaded, Some(doc));
    }

    #[test]
    fn test_read_json_rejects_corrupt_document() {
        let store = MemoryStore::new();
        store.set("doc", "not json").unwrap();
        let result: Result<Option<Doc>> = read_json(&store, "doc");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to deserialize 'doc'"));
    }
}
