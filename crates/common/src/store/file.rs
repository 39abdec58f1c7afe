use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{PersistenceStore, StoreError};

/// Store backed by a single JSON object on disk.
///
/// Every write rewrites the file (via a sibling temp file and a rename),
///  so a crash leaves either the old or the new state, never half of one.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating it lazily on first write
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
                    key: path.display().to_string(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Opened state file {} ({} keys)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Encode {
            key: self.path.display().to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keys;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set(keys::CURRENT_RUN_ID, "run-789").unwrap();
            store.set(keys::SCAN_STATUS, "Running").unwrap();
            store.set(keys::SEARCH_TERM, "ssn").unwrap();
            store.remove(keys::SEARCH_TERM).unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::CURRENT_RUN_ID).unwrap().as_deref(),
            Some("run-789")
        );
        assert_eq!(
            reopened.get(keys::SCAN_STATUS).unwrap().as_deref(),
            Some("Running")
        );
        assert_eq!(reopened.get(keys::SEARCH_TERM).unwrap(), None);
    }

    #[test]
    fn test_missing_and_empty_files_open_empty() {
        let dir = TempDir::new().unwrap();

        let missing = FileStore::open(dir.path().join("nested").join("state.json")).unwrap();
        assert_eq!(missing.get(keys::SCAN_STATUS).unwrap(), None);
        missing.set(keys::SCAN_STATUS, "Failed").unwrap();
        assert!(missing.path().exists());

        let empty_path = dir.path().join("empty.json");
        fs::write(&empty_path, "").unwrap();
        let empty = FileStore::open(&empty_path).unwrap();
        assert_eq!(empty.get(keys::SCAN_STATUS).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Decode { .. })
        ));
    }
}
