//! File-per-key snapshot store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{validate_key, SnapshotStore, StoreError};

/// Stores each snapshot as `<dir>/<key>.json`.
///
/// The directory is created on first write.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = serde_json::from_str(&contents).map_err(|e| StoreError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(value))
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let contents = serde_json::to_string(value).map_err(|e| StoreError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        // Replace atomically: readers see the old snapshot or the new one.
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &path)?;

        debug!("Wrote snapshot {:?}", path);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(key)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_put_get_exists() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path().join("meetings"));

        assert!(!store.exists("BAICS_1").unwrap());
        assert!(store.get("BAICS_1").unwrap().is_none());

        store.put("BAICS_1", &json!({"id": 42})).unwrap();

        assert!(store.exists("BAICS_1").unwrap());
        assert_eq!(store.get("BAICS_1").unwrap(), Some(json!({"id": 42})));
        assert!(temp_dir.path().join("meetings/BAICS_1.json").is_file());
    }

    #[test]
    fn test_put_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path());

        store.put("EVT_1", &json!({"id": 1, "duration": 60})).unwrap();
        store.put("EVT_1", &json!({"id": 1, "duration": 90})).unwrap();

        assert_eq!(store.get("EVT_1").unwrap().unwrap()["duration"], json!(90));
    }

    #[test]
    fn test_put_leaves_only_snapshot_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path());

        store.put("EVT_1", &json!({"id": 1, "duration": 60})).unwrap();
        store.put("EVT_1", &json!({"id": 1, "duration": 90})).unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["EVT_1.json".to_string()]);
    }

    #[test]
    fn test_stale_temp_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path());
        store.put("EVT_1", &json!({"id": 1})).unwrap();

        // Leftover of an interrupted write.
        fs::write(temp_dir.path().join(".EVT_1.json.tmp"), "{trunc").unwrap();

        assert_eq!(store.get("EVT_1").unwrap(), Some(json!({"id": 1})));
        store.put("EVT_1", &json!({"id": 2})).unwrap();
        assert_eq!(store.get("EVT_1").unwrap(), Some(json!({"id": 2})));
        assert!(!temp_dir.path().join(".EVT_1.json.tmp").exists());
    }

    #[test]
    fn test_get_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path());
        fs::write(temp_dir.path().join("EVT_1.json"), "{not json").unwrap();

        let err = store.get("EVT_1").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path());

        let err = store.put("../outside", &json!({})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
