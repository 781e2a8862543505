//! Storage Module
//!
//! The raw key-value capability the cache engine sits on. A storage area stores
//! text under string keys, can be cleared as a whole, and delivers a
//! [`StorageEvent`] to every subscriber for every mutation.
//!
//! # Areas
//! - `local`: [`FileBackend`], persisted to a JSON file
//! - `session`: [`MemoryBackend`], lives as long as the handle

mod file;
mod memory;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::{Config, StorageType};
use crate::error::Result;

pub use file::FileBackend;
pub use memory::MemoryBackend;

// == Public Constants ==
/// Default per-area quota in bytes (key bytes + value bytes)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024; // 5 MiB

// == Storage Event ==
/// A change to a storage area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageEvent {
    /// Changed key, `None` when the whole area was cleared
    pub key: Option<String>,
    /// Text stored before the change
    pub old_value: Option<String>,
    /// Text stored after the change, `None` on removal or clear
    pub new_value: Option<String>,
    /// Area the change happened in
    pub storage_area: StorageType,
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
}

// == Storage Backend ==
/// Synchronous string-keyed storage area.
///
/// Implementations are shared behind `Arc` by every engine bound to the same
/// area, so all methods take `&self`.
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Which area this backend represents.
    fn area(&self) -> StorageType;

    /// Persists `value` under `key`. Fails when the quota would be exceeded.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Reads the text stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Erases every key in the area.
    fn clear(&self) -> Result<()>;

    /// Number of keys currently stored.
    fn len(&self) -> usize;

    /// Returns true if the area holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to change events for this area.
    ///
    /// Every event after this call is queued for the receiver until it is read.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageEvent>;
}

/// Opens the backend selected by `config.storage_type`.
pub fn open_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config.storage_type {
        StorageType::Session => Arc::new(MemoryBackend::with_quota(config.quota_bytes)),
        StorageType::Local => Arc::new(FileBackend::open(
            &config.storage_path,
            config.quota_bytes,
        )?),
    };
    Ok(backend)
}

// == Change Bus ==
/// Fan-out of storage events to every subscriber of one area.
///
/// Each subscriber owns an unbounded queue, so a slow listener never loses
/// events.
#[derive(Debug)]
pub(crate) struct ChangeBus {
    area: StorageType,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<StorageEvent>>>,
}

impl ChangeBus {
    pub(crate) fn new(area: StorageType) -> Self {
        Self {
            area,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }
        rx
    }

    /// Publishes a change. Writes that leave the value unchanged are not announced.
    pub(crate) fn emit(
        &self,
        key: Option<&str>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        if key.is_some() && old_value == new_value {
            return;
        }
        let event = StorageEvent {
            key: key.map(str::to_string),
            old_value,
            new_value,
            storage_area: self.area,
            timestamp: Utc::now(),
        };

        // Receivers that were dropped are pruned on the way
        let mut subscribers = match self.subscribers.lock() {
            Ok(subscribers) => subscribers,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Bytes the area would occupy after storing `value` under `key`.
pub(crate) fn projected_usage(items: &HashMap<String, String>, key: &str, value: &str) -> usize {
    let current: usize = items
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum();
    current + key.len() + value.len()
}
