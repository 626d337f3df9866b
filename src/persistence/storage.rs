use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Persisted keys
pub const TODOS_KEY: &str = "todos";
pub const PROJECTS_KEY: &str = "projects";
pub const CUSTOM_TIME_KEY: &str = "custom_time";
pub const MUSIC_MUTED_KEY: &str = "music_muted";
pub const DARK_MODE_KEY: &str = "dark_mode";
pub const COFFEE_SHOP_IMAGE_KEY: &str = "coffee_shop_image";
pub const SELECTED_SONG_INDEX_KEY: &str = "selected_song_index";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing '{key}' ({needed} bytes needed, limit {limit})")]
    QuotaExceeded { key: String, needed: usize, limit: usize },

    #[error("storage I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Synchronous string key-value storage.
///
/// A `set` replaces the whole value in one step: readers see either the old or
/// the new value, never a mix.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Storage handle shared by every observer in the process
pub type SharedStorage = Rc<RefCell<dyn KeyValueStore>>;

/// In-memory storage with an optional byte quota and a write counter
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the total stored bytes past `limit`
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("todos").unwrap(), None);

        store.set("todos", "[]").unwrap();
        assert_eq!(store.get("todos").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.write_count(), 1);

        store.remove("todos").unwrap();
        assert_eq!(store.get("todos").unwrap(), None);
    }

    #[test]
    fn test_memory_store_quota() {
        let mut store = MemoryStore::with_quota(20);
        store.set("a", "0123456789").unwrap();

        let err = store.set("b", "0123456789").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.write_count(), 1);

        // Replacing an existing value only counts the new size
        store.set("a", "01234567890123").unwrap();
    }

    #[test]
    fn test_shared_storage_coerces_from_concrete() {
        let memory = Rc::new(RefCell::new(MemoryStore::new()));
        let shared: SharedStorage = memory.clone();
        shared.borrow_mut().set("k", "v").unwrap();
        assert_eq!(memory.borrow().write_count(), 1);
    }
}
