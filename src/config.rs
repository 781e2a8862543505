//! Configuration Module
//!
//! Handles loading and managing engine and server configuration from environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_QUOTA_BYTES;

/// Which storage area the engine binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Persistent area, survives restarts
    #[default]
    Local,
    /// Session area, lives as long as the process
    Session,
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageType::Local),
            "session" => Ok(StorageType::Session),
            other => Err(format!("unknown storage type '{}'", other)),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Local => write!(f, "local"),
            StorageType::Session => write!(f, "session"),
        }
    }
}

/// Engine and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage area to bind
    pub storage_type: StorageType,
    /// Obfuscate records on write
    pub encrypt: bool,
    /// Default expiry delay in milliseconds for writes that arm a timer
    pub cache_time_ms: u64,
    /// File backing the persistent area
    pub storage_path: PathBuf,
    /// Byte quota per storage area (key bytes + value bytes)
    pub quota_bytes: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORAGE_TYPE` - `local` or `session` (default: local)
    /// - `ENCRYPT` - Obfuscate stored records (default: true)
    /// - `CACHE_TIME_MS` - Default expiry delay in milliseconds (default: 60000)
    /// - `STORAGE_PATH` - File for the persistent area (default: local_stash.json)
    /// - `STORAGE_QUOTA` - Byte quota per area (default: 5 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_type: parse_env("STORAGE_TYPE").unwrap_or(defaults.storage_type),
            encrypt: parse_env("ENCRYPT").unwrap_or(defaults.encrypt),
            cache_time_ms: parse_env("CACHE_TIME_MS").unwrap_or(defaults.cache_time_ms),
            storage_path: env::var("STORAGE_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            quota_bytes: parse_env("STORAGE_QUOTA").unwrap_or(defaults.quota_bytes),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Default expiry delay as a Duration.
    pub fn cache_time(&self) -> Duration {
        Duration::from_millis(self.cache_time_ms)
    }

    /// Builder-style override of the storage area.
    pub fn with_storage_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = storage_type;
        self
    }

    /// Builder-style override of the obfuscation flag.
    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Local,
            encrypt: true,
            cache_time_ms: 60_000,
            storage_path: PathBuf::from("local_stash.json"),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            server_port: 3000,
        }
    }
}
