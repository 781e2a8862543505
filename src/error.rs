//! Error types for the stash engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine, its storage backends and the HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value could not be converted to stored text
    #[error("Error serializing state {key}: {reason}")]
    Serialize { key: String, reason: String },

    /// Stored text is not valid serialized data
    #[error("Error decoding state {key}: {reason}")]
    Decode { key: String, reason: String },

    /// Backend rejected a write (quota exceeded, I/O failure)
    #[error("Error setting state {key}: {reason}")]
    StorageWrite { key: String, reason: String },

    /// Backend read failed
    #[error("Error retrieving state {key}: {reason}")]
    StorageRead { key: String, reason: String },

    /// Key not present in the storage area
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A host capability the operation needs is missing
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub(crate) fn serialize(key: &str, reason: impl ToString) -> Self {
        Self::Serialize {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(key: &str, reason: impl ToString) -> Self {
        Self::Decode {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn storage_write(key: &str, reason: impl ToString) -> Self {
        Self::StorageWrite {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn storage_read(key: &str, reason: impl ToString) -> Self {
        Self::StorageRead {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialize { .. } | CacheError::Decode { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CacheError::StorageWrite { .. } => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::StorageRead { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the stash engine.
pub type Result<T> = std::result::Result<T, CacheError>;
