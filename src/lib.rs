//! Local Stash - An ephemeral key-value cache over pluggable storage areas
//!
//! Persists small pieces of JSON state under string keys, merges new writes
//! into what is already stored, obfuscates records, expires them after a
//! configurable delay and reports every change to the storage area.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEngine, SetOptions};
pub use config::{Config, StorageType};
pub use error::CacheError;
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageEvent};
