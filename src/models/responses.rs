//! Response DTOs for the stash API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::config::StorageType;

/// Response body for the GET operation (GET /state/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /state/:key)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// The key that was set
    pub key: String,
    /// State as re-read after the write
    pub value: Option<Value>,
    /// Whether an expiry timer was armed
    pub expires: bool,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, value: Option<Value>, expires: bool) -> Self {
        Self {
            key: key.into(),
            value,
            expires,
        }
    }
}

/// Response body for the DELETE operations
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
}

impl DeleteResponse {
    /// Response for a single removed key
    pub fn removed(key: &str) -> Self {
        Self {
            message: format!("Key '{}' removed successfully", key),
        }
    }

    /// Response for a cleared storage area
    pub fn cleared(area: StorageType) -> Self {
        Self {
            message: format!("Storage area '{}' cleared", area),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub storage_type: StorageType,
    pub encrypt: bool,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
    pub expirations: u64,
    pub pending_expiries: usize,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from engine statistics
    pub fn new(
        storage_type: StorageType,
        encrypt: bool,
        stats: &CacheStats,
        pending_expiries: usize,
    ) -> Self {
        Self {
            storage_type,
            encrypt,
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            errors: stats.errors,
            expirations: stats.expirations,
            pending_expiries,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
