//! SQLite-backed snapshot store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{validate_key, SnapshotStore, StoreError};

/// Snapshot store keeping one row per key in an embedded database.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Open (or create) the database file and its schema.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let conn = self.lock()?;

        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM snapshots WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        body.map(|b| {
            serde_json::from_str(&b).map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        let body = value.to_string();
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO snapshots (key, body, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![key, body, Utc::now().to_rfc3339()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM snapshots WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_put_get() {
        let store = SqliteSnapshotStore::in_memory().unwrap();

        assert!(!store.exists("EVT_1").unwrap());
        assert!(store.get("EVT_1").unwrap().is_none());

        store.put("EVT_1", &json!({"id": 7, "topic": "Talk A"})).unwrap();
        assert!(store.exists("EVT_1").unwrap());
        assert_eq!(store.get("EVT_1").unwrap().unwrap()["topic"], json!("Talk A"));

        store.put("EVT_1", &json!({"id": 7, "topic": "Talk B"})).unwrap();
        assert_eq!(store.get("EVT_1").unwrap().unwrap()["topic"], json!("Talk B"));
    }

    #[test]
    fn test_file_database_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("snapshots.db");

        {
            let store = SqliteSnapshotStore::new(&db_path).unwrap();
            store.put("users", &json!([{"id": "u1", "email": "a@x.com"}])).unwrap();
        }

        let store = SqliteSnapshotStore::new(&db_path).unwrap();
        assert!(store.exists("users").unwrap());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        let err = store.exists("no/slashes").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
