//! File-backed key-value store
//!
//! All keys live in one JSON object on disk. Every `set`/`remove` rewrites
//! the file through a temporary sibling and a rename, so a crash mid-write
//! leaves the previous contents in place.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use shared::{KeyValueStore, StorageError};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`, creating it lazily on first write.
    ///
    /// An unreadable file is moved aside to `<path>.corrupt` and the store
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    let aside = path.with_extension("corrupt");
                    tracing::warn!(
                        "Store file {} is not valid JSON ({}); moving it to {}",
                        path.display(),
                        e,
                        aside.display()
                    );
                    fs::rename(&path, &aside).map_err(backend)?;
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(backend(e)),
        };

        tracing::info!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current contents to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(backend)?;
        }

        let json = serde_json::to_string(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(backend)?;
        fs::rename(&tmp, &self.path).map_err(backend)?;
        Ok(())
    }
}

fn backend(err: std::io::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            // Keep memory consistent with disk.
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn total_chars(&self) -> Result<usize, StorageError> {
        Ok(self.entries.iter().map(|(k, v)| k.len() + v.len()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("roastlog-store-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_values_survive_reopen() {
        let path = temp_path("store.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set("coffee_roasts", "[]".to_string()).unwrap();
        store.set("green_coffees", "[{}]".to_string()).unwrap();
        store.remove("green_coffees").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("coffee_roasts").unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("green_coffees").unwrap(), None);
        assert_eq!(reopened.total_chars().unwrap(), "coffee_roasts".len() + 2);
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let path = temp_path("store.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.total_chars().unwrap(), 0);
        assert!(path.with_extension("corrupt").exists());
    }
}
