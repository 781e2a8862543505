//! Cache Engine Module
//!
//! The read/merge/write/expire pipeline between the application and a storage
//! area.
//!
//! `get_state` and `set_state` never fail: errors are logged and mapped to
//! `None`, which callers cannot tell apart from "no data". The `try_*`
//! variants return the underlying [`CacheError`](crate::error::CacheError) instead.
//!
//! `set_state` is not atomic. Another writer sharing the area may slip in
//! between the read and the write, and its update is then lost.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::cache::{merge, Codec, CacheStats, DEFAULT_CACHE_TIME, DEFAULT_KEY};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{open_backend, StorageBackend, StorageEvent};
use crate::tasks::{ChangeNotifier, ExpiryScheduler, Subscription};

// == Set Options ==
/// Per-write expiry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Arm an expiry timer after the write
    pub cache_timeout: bool,
    /// Delay before the key is erased
    pub cache_time: Duration,
}

impl SetOptions {
    /// A write that never expires.
    pub fn persistent() -> Self {
        Self {
            cache_timeout: false,
            ..Self::default()
        }
    }

    /// A write that expires after `cache_time`.
    pub fn expire_after(cache_time: Duration) -> Self {
        Self {
            cache_timeout: true,
            cache_time,
        }
    }
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            cache_timeout: true,
            cache_time: DEFAULT_CACHE_TIME,
        }
    }
}

// == Cache Engine ==
/// Ephemeral key-value cache over one storage area.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Debug, Clone)]
pub struct CacheEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    backend: Arc<dyn StorageBackend>,
    codec: Codec,
    encrypt: bool,
    cache_time: Duration,
    scheduler: ExpiryScheduler,
    notifier: ChangeNotifier,
    stats: Mutex<CacheStats>,
}

impl CacheEngine {
    // == Constructors ==
    /// Creates an engine over `backend`, binding timers to the current runtime if one exists.
    pub fn new(config: &Config, backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_runtime(config, backend, Handle::try_current().ok())
    }

    /// Creates an engine with an explicit runtime for timers and change events.
    ///
    /// Without a runtime, writes still succeed but never expire, and
    /// `on_change` reports the capability as unavailable.
    pub fn with_runtime(
        config: &Config,
        backend: Arc<dyn StorageBackend>,
        runtime: Option<Handle>,
    ) -> Self {
        if runtime.is_none() {
            warn!("Cache engine created without a runtime; expiry and change events are disabled");
        }

        Self {
            inner: Arc::new(EngineInner {
                notifier: ChangeNotifier::new(backend.clone(), runtime.clone()),
                scheduler: ExpiryScheduler::new(runtime),
                backend,
                codec: Codec::new(),
                encrypt: config.encrypt,
                cache_time: config.cache_time(),
                stats: Mutex::new(CacheStats::new()),
            }),
        }
    }

    /// Opens the storage area named by `config` and creates an engine over it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = open_backend(config)?;
        info!(
            "Cache engine bound to {} storage (obfuscation {})",
            backend.area(),
            if config.encrypt { "on" } else { "off" }
        );
        Ok(Self::new(config, backend))
    }

    // == Accessors ==
    /// The storage area this engine writes to.
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.inner.backend
    }

    /// Whether writes are obfuscated.
    pub fn encrypt(&self) -> bool {
        self.inner.encrypt
    }

    /// Write options using the configured cache time.
    pub fn default_options(&self) -> SetOptions {
        SetOptions::expire_after(self.inner.cache_time)
    }

    /// Number of expiry timers still pending.
    pub fn pending_expiries(&self) -> usize {
        self.inner.scheduler.pending()
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self
            .inner
            .stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default();
        stats.set_total_entries(self.inner.backend.len());
        stats
    }

    // == Get ==
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` if the key is absent, holds `null` or the expired
    /// placeholder, or if reading or decoding fails.
    pub fn get_state(&self, key: &str) -> Option<Value> {
        match self.try_get_state(key) {
            Ok(value) => value,
            Err(e) => {
                error!("Error retrieving local state: {}", e);
                self.record(CacheStats::record_error);
                None
            }
        }
    }

    /// Reads the value stored under `key`, surfacing storage and decode errors.
    pub fn try_get_state(&self, key: &str) -> Result<Option<Value>> {
        let value = self.read(resolve_key(key))?;
        if value.is_some() {
            self.record(CacheStats::record_hit);
        } else {
            self.record(CacheStats::record_miss);
        }
        Ok(value)
    }

    // == Set ==
    /// Merges `value` into the state under `key` and returns what was persisted.
    ///
    /// Returns `None` if the write failed.
    pub fn set_state(&self, key: &str, value: Value, options: SetOptions) -> Option<Value> {
        match self.try_set_state(key, value, options) {
            Ok(persisted) => persisted,
            Err(e) => {
                error!("Error persisting state: {}", e);
                self.record(CacheStats::record_error);
                None
            }
        }
    }

    /// Merges `value` into the state under `key`, surfacing write errors.
    ///
    /// An existing record that cannot be read is treated as absent and
    /// overwritten.
    pub fn try_set_state(
        &self,
        key: &str,
        value: Value,
        options: SetOptions,
    ) -> Result<Option<Value>> {
        let key = resolve_key(key);

        let existing = match self.read(key) {
            Ok(existing) => existing,
            Err(e) => {
                warn!("Overwriting unreadable state {}: {}", key, e);
                None
            }
        };

        let merged = merge(existing, value);
        let record = self.inner.codec.encode(key, &merged, self.inner.encrypt)?;
        self.inner.backend.set_item(key, &record)?;
        self.record(CacheStats::record_write);

        if options.cache_timeout {
            self.arm_expiry(key, options.cache_time);
        }

        self.read(key)
    }

    // == Remove ==
    /// Removes a single key from the storage area. Returns false on failure.
    pub fn remove_state(&self, key: &str) -> bool {
        match self.try_remove_state(key) {
            Ok(()) => true,
            Err(e) => {
                error!("Error removing state: {}", e);
                self.record(CacheStats::record_error);
                false
            }
        }
    }

    /// Removes a single key from the storage area, surfacing backend errors.
    pub fn try_remove_state(&self, key: &str) -> Result<()> {
        self.inner.backend.remove_item(resolve_key(key))
    }

    // == Reset ==
    /// Clears every key in the storage area, including keys this engine never wrote.
    pub fn reset_storage(&self) {
        if let Err(e) = self.try_reset_storage() {
            error!("Error resetting storage: {}", e);
            self.record(CacheStats::record_error);
        }
    }

    /// Clears the whole storage area, surfacing backend errors.
    pub fn try_reset_storage(&self) -> Result<()> {
        self.inner.backend.clear()?;
        info!("Cleared {} storage area", self.inner.backend.area());
        Ok(())
    }

    // == Change Events ==
    /// Invokes `callback` for every change to any key in the storage area.
    pub fn on_change<F>(&self, callback: F) -> Result<Subscription>
    where
        F: FnMut(StorageEvent) + Send + 'static,
    {
        self.inner.notifier.on_change(callback)
    }

    // == Internals ==
    fn read(&self, key: &str) -> Result<Option<Value>> {
        let Some(text) = self.inner.backend.get_item(key)? else {
            return Ok(None);
        };
        let value = self.inner.codec.decode(key, &text)?;
        Ok(Some(value).filter(is_present))
    }

    fn arm_expiry(&self, key: &str, delay: Duration) {
        // The timer keeps the engine alive until it fires; an armed expiry
        // outlives every handle the caller holds.
        let engine = self.clone();
        self.inner.scheduler.arm(key, delay, move |key| engine.expire(&key));
    }

    /// Overwrites `key` with the empty placeholder without arming another timer.
    fn expire(&self, key: &str) {
        debug!("Expiring state {}", key);
        self.record(CacheStats::record_expiration);
        self.set_state(key, Value::String(String::new()), SetOptions::persistent());
    }

    fn record(&self, update: fn(&mut CacheStats)) {
        if let Ok(mut stats) = self.inner.stats.lock() {
            update(&mut *stats);
        }
    }
}

/// Falls back to the reserved key when the caller passes none.
fn resolve_key(key: &str) -> &str {
    if key.is_empty() {
        DEFAULT_KEY
    } else {
        key
    }
}

/// `null` and the expiry placeholder read as "no data".
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
