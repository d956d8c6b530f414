//! Local snapshot store.
//!
//! Maps a key (meeting identifier, or `users` for the user directory) to the
//! last-known JSON representation of a remote resource. A key being present
//! is the only signal that the remote resource was created.

mod file;
mod memory;
mod sqlite;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use sqlite::SqliteSnapshotStore;

use std::sync::{Arc, LazyLock};

use regex_lite::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};

/// Key under which the user directory snapshot is stored.
pub const USERS_KEY: &str = "users";

/// Keys double as file names, so they are restricted to a safe alphabet.
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]*$").expect("snapshot key pattern is valid")
});

/// Errors from snapshot store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key cannot be used as a snapshot name.
    #[error("Invalid snapshot key: {0:?}")]
    InvalidKey(String),

    /// Stored content is not valid JSON.
    #[error("Malformed snapshot {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),
}

/// Key/value persistence for resource snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Get the snapshot stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store (or overwrite) the snapshot under `key`.
    fn put(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Check whether a snapshot exists under `key`.
    fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

/// Check that `key` is usable as a snapshot key.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if KEY_PATTERN.is_match(key) {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Factory function to create the snapshot store selected by config
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn SnapshotStore>, StoreError> {
    match config.backend {
        StoreBackend::File => Ok(Arc::new(FileSnapshotStore::new(config.path.clone()))),
        StoreBackend::Sqlite => {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Ok(Arc::new(SqliteSnapshotStore::new(&config.path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_create_store_backends() {
        let temp_dir = TempDir::new().unwrap();

        let file_store = create_store(&StoreConfig {
            backend: StoreBackend::File,
            path: temp_dir.path().join("meetings"),
        })
        .unwrap();
        file_store.put("EVT_1", &json!({"id": 1})).unwrap();
        assert!(temp_dir.path().join("meetings/EVT_1.json").is_file());

        let sqlite_store = create_store(&StoreConfig {
            backend: StoreBackend::Sqlite,
            path: temp_dir.path().join("db/snapshots.db"),
        })
        .unwrap();
        sqlite_store.put("EVT_1", &json!({"id": 1})).unwrap();
        assert!(sqlite_store.exists("EVT_1").unwrap());
    }

    #[test]
    fn test_key_pattern_compiles_once() {
        let first: *const Regex = LazyLock::force(&KEY_PATTERN);
        assert!(validate_key("EVT_1").is_ok());
        assert!(std::ptr::eq(first, LazyLock::force(&KEY_PATTERN)));
    }

    #[test]
    fn test_validate_key_accepts_identifiers() {
        for key in ["BAICS_12", "meet_and_greet_3", "EVT-1", "users", "a.b"] {
            assert!(validate_key(key).is_ok(), "{} should be valid", key);
        }
    }

    #[test]
    fn test_validate_key_rejects_unsafe_names() {
        for key in ["", ".hidden", "../escape", "a/b", "with space", "ünïcode"] {
            let err = validate_key(key).unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "{} should be invalid", key);
        }
    }
}
