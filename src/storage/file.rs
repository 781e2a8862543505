//! File-backed persistent area.
//!
//! The whole area is held in memory and rewritten to a single JSON object file
//! after every mutation. Writes go to a sibling temp file first and are renamed
//! into place.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::StorageType;
use crate::error::{CacheError, Result};
use crate::storage::{projected_usage, ChangeBus, StorageBackend, StorageEvent};

// == File Backend ==
/// Local-scoped storage area persisted to disk.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    items: RwLock<HashMap<String, String>>,
    quota_bytes: usize,
    bus: ChangeBus,
}

impl FileBackend {
    /// Opens the area stored at `path`, creating an empty one if the file is missing.
    pub fn open(path: impl AsRef<Path>, quota_bytes: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => HashMap::new(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| CacheError::storage_read(&path.display().to_string(), e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(CacheError::storage_read(&path.display().to_string(), e)),
        };

        info!(
            "Opened local storage area at {} with {} keys",
            path.display(),
            items.len()
        );

        Ok(Self {
            path,
            items: RwLock::new(items),
            quota_bytes,
            bus: ChangeBus::new(StorageType::Local),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str, items: &HashMap<String, String>) -> Result<()> {
        let text = serde_json::to_string(items).map_err(|e| CacheError::storage_write(key, e))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text).map_err(|e| CacheError::storage_write(key, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| CacheError::storage_write(key, e))?;
        debug!("Persisted {} keys to {}", items.len(), self.path.display());
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn area(&self) -> StorageType {
        StorageType::Local
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| CacheError::storage_write(key, e))?;

        if projected_usage(&items, key, value) > self.quota_bytes {
            return Err(CacheError::storage_write(
                key,
                format!("quota of {} bytes exceeded", self.quota_bytes),
            ));
        }

        let old = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(key, &items) {
            match &old {
                Some(previous) => items.insert(key.to_string(), previous.clone()),
                None => items.remove(key),
            };
            return Err(e);
        }
        drop(items);

        self.bus.emit(Some(key), old, Some(value.to_string()));
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|e| CacheError::storage_read(key, e))?;
        Ok(items.get(key).cloned())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| CacheError::storage_write(key, e))?;

        let Some(old) = items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(key, &items) {
            items.insert(key.to_string(), old);
            return Err(e);
        }
        drop(items);

        self.bus.emit(Some(key), Some(old), None);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| CacheError::storage_write("*", e))?;

        // Clearing an empty area is not a change
        if items.is_empty() {
            return Ok(());
        }
        let previous = std::mem::take(&mut *items);
        if let Err(e) = self.persist("*", &items) {
            *items = previous;
            return Err(e);
        }
        drop(items);

        self.bus.emit(None, None, None);
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageEvent> {
        self.bus.subscribe()
    }
}
