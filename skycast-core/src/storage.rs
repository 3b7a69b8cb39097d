//! Persisted key-value storage for dashboard state.
//!
//! Each key holds one serialized JSON value. Writes replace the whole value,
//! so a reader never observes a half-written entry.

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

pub const CHAT_MESSAGES_KEY: &str = "chatMessages";
pub const SEARCH_HISTORY_KEY: &str = "search-history";
pub const UNIT_KEY: &str = "weather-app-unit";

pub trait Storage: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and deserialize `key`. Unreadable or corrupt values are logged and
/// treated as absent.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, "failed to read stored value: {e:#}");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, "ignoring corrupt stored value: {e}");
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize value for key '{key}'"))?;
    storage.set(key, &raw)
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read storage file: {}", path.display()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create storage directory: {}", self.dir.display())
        })?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value)
            .with_context(|| format!("Failed to write storage file: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace storage file: {}", path.display()))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove storage file: {}", path.display()))
            }
        }
    }
}

/// Process-local storage, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values.lock().map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        FileStorage::new(dir.path()).set(UNIT_KEY, "\"imperial\"").unwrap();

        let reopened = FileStorage::new(dir.path());
        assert_eq!(reopened.get(UNIT_KEY).unwrap().as_deref(), Some("\"imperial\""));
        assert!(!dir.path().join("weather-app-unit.json.tmp").exists());
    }

    #[test]
    fn file_storage_missing_key_and_remove_are_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get(CHAT_MESSAGES_KEY).unwrap(), None);
        storage.remove(CHAT_MESSAGES_KEY).unwrap();
    }

    #[test]
    fn load_json_ignores_corrupt_values() {
        let storage = MemoryStorage::new();
        storage.set(SEARCH_HISTORY_KEY, "{not json").unwrap();

        let loaded: Option<Vec<String>> = load_json(&storage, SEARCH_HISTORY_KEY);
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_json() {
        let storage = MemoryStorage::new();
        save_json(&storage, "numbers", &[1, 2, 3]).unwrap();

        let loaded: Option<Vec<i32>> = load_json(&storage, "numbers");
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }
}
