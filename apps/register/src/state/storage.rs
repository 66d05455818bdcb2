//! # File-Backed Key-Value Store
//!
//! Keeps the register's tabs across restarts: one file per key inside the
//! sessions directory.
//!
//! ```text
//! data_dir/sessions/
//! ├── shopfront.sessions.json        ◄─── open tabs
//! ├── shopfront.active_session.json  ◄─── which tab is showing
//! └── shopfront.parked.json          ◄─── held orders
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write leaves the previous blob readable.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use shopfront_core::{KeyValueStore, StoreError};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Uses `dir`, creating it on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileKeyValueStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn io_error(key: &str, err: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        message: err.to_string(),
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %e, "Unreadable session file");
                }
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| io_error(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(key, e))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::{CatalogItem, KvSessionStore, Money, SessionManager};

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileKeyValueStore::new(dir.path().join("sessions"));

        assert_eq!(store.get("shopfront.parked"), None);

        store.set("shopfront.parked", "[]").unwrap();
        assert_eq!(store.get("shopfront.parked").as_deref(), Some("[]"));
        assert!(dir.path().join("sessions/shopfront.parked.json").exists());

        store.remove("shopfront.parked").unwrap();
        assert_eq!(store.get("shopfront.parked"), None);

        // Removing twice is fine
        store.remove("shopfront.parked").unwrap();
    }

    #[test]
    fn test_tabs_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let item = CatalogItem {
            id: "i-1".to_string(),
            sku: "TEA-1".to_string(),
            name: "Tea".to_string(),
            unit_price: Money::from_cents(1000),
            stock_qty: 5,
            unit: "pkt".to_string(),
        };

        let tab_id = {
            let store = KvSessionStore::new(FileKeyValueStore::new(dir.path()));
            let mut manager = SessionManager::load(store);
            manager.open_tab();
            manager.with_active_mut(|s| s.add_line(&item)).unwrap();
            manager.active_id().to_string()
        };

        let store = KvSessionStore::new(FileKeyValueStore::new(dir.path()));
        let manager = SessionManager::load(store);

        assert_eq!(manager.sessions().len(), 2);
        assert_eq!(manager.active_id(), tab_id);
        assert_eq!(manager.active().subtotal(), Money::from_cents(1000));
    }

    #[test]
    fn test_corrupt_file_reads_as_no_state() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shopfront.sessions.json"), "{not json").unwrap();

        let manager = SessionManager::load(KvSessionStore::new(FileKeyValueStore::new(dir.path())));
        assert_eq!(manager.sessions().len(), 1);
        assert!(manager.active().is_empty());
    }
}
