//! Durable key/value state that survives a console restart.
//!
//! Values are plain strings; composite values are stored as JSON.
//!  A missing key always means "never set" and is not an error.

use serde::de::DeserializeOwned;
use serde::Serialize;

mod file;
pub mod keys;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid stored value for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String keyed store shared by the setup flow, the scan monitor and
///  the search session. Writes are synchronous.
pub trait PersistenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON helpers available on every store
pub trait PersistenceStoreExt: PersistenceStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &raw)
    }

    /// Set `key` to `value`, or remove it when `value` is `None`
    fn set_or_remove(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }
}

impl<S: PersistenceStore + ?Sized> PersistenceStoreExt for S {}

/// Forget everything the search view persisted, leaving the
///  session markers alone
pub fn clear_search_session(store: &dyn PersistenceStore) -> Result<(), StoreError> {
    for key in keys::SEARCH_KEYS {
        store.remove(key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_search_session_keeps_session_markers() {
        let store = MemoryStore::default();
        for key in keys::SEARCH_KEYS {
            store.set(key, "value").unwrap();
        }
        store.set(keys::SESSION_ID, "abc").unwrap();
        store.set(keys::USERNAME, "operator").unwrap();

        clear_search_session(&store).unwrap();

        for key in keys::SEARCH_KEYS {
            assert_eq!(store.get(key).unwrap(), None, "{} should be cleared", key);
        }
        assert_eq!(store.get(keys::SESSION_ID).unwrap().as_deref(), Some("abc"));
        assert_eq!(
            store.get(keys::USERNAME).unwrap().as_deref(),
            Some("operator")
        );
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::default();
        store
            .set_json(keys::SCAN_RESULTS, &vec!["a.txt", "b.txt"])
            .unwrap();
        let results: Option<Vec<String>> = store.get_json(keys::SCAN_RESULTS).unwrap();
        assert_eq!(results.unwrap(), vec!["a.txt", "b.txt"]);

        let missing: Option<Vec<String>> = store.get_json(keys::SEARCH_FOUND).unwrap();
        assert!(missing.is_none());

        store.set(keys::SCAN_RESULTS, "not json").unwrap();
        let err = store.get_json::<Vec<String>>(keys::SCAN_RESULTS).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_set_or_remove() {
        let store = MemoryStore::default();
        store.set_or_remove(keys::SCAN_LEVEL, Some("Full")).unwrap();
        assert_eq!(store.get(keys::SCAN_LEVEL).unwrap().as_deref(), Some("Full"));
        store.set_or_remove(keys::SCAN_LEVEL, None).unwrap();
        assert_eq!(store.get(keys::SCAN_LEVEL).unwrap(), None);
    }
}
