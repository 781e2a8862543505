//! In-memory session area.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::mpsc;

use crate::config::StorageType;
use crate::error::{CacheError, Result};
use crate::storage::{
    projected_usage, ChangeBus, StorageBackend, StorageEvent, DEFAULT_QUOTA_BYTES,
};

// == Memory Backend ==
/// Session-scoped storage area held in process memory.
#[derive(Debug)]
pub struct MemoryBackend {
    items: RwLock<HashMap<String, String>>,
    quota_bytes: usize,
    bus: ChangeBus,
}

impl MemoryBackend {
    /// Creates an empty area with the default quota.
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    /// Creates an empty area limited to `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes,
            bus: ChangeBus::new(StorageType::Session),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryBackend {
    fn area(&self) -> StorageType {
        StorageType::Session
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
        let old = self
            .items
            .write()
            .map_err(|e| CacheError::storage_write(key, e))?
            .remove(key);
        if old.is_some() {
            self.bus.emit(Some(key), old, None);
        }
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
        items.clear();
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
