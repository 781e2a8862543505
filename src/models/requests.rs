//! Request DTOs for the stash API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::SetOptions;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /state/:key)
///
/// # Fields
/// - `value`: Any JSON value, merged into what is already stored
/// - `cache_timeout`: Arm an expiry timer (uses the engine default if not specified)
/// - `cache_time`: Expiry delay in milliseconds (uses the engine default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: Value,
    /// Whether the write expires
    #[serde(default)]
    pub cache_timeout: Option<bool>,
    /// Expiry delay in milliseconds
    #[serde(default)]
    pub cache_time: Option<u64>,
}

impl SetRequest {
    /// Resolves the write options, filling gaps from `defaults`.
    pub fn options(&self, defaults: SetOptions) -> SetOptions {
        SetOptions {
            cache_timeout: self.cache_timeout.unwrap_or(defaults.cache_timeout),
            cache_time: self
                .cache_time
                .map(Duration::from_millis)
                .unwrap_or(defaults.cache_time),
        }
    }
}

/// Validates a key taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}
