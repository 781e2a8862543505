//! Record Codec
//!
//! Converts JSON values to stored text and back. Obfuscated records carry a
//! leading `#` followed by the JSON text with every UTF-16 code unit XORed
//! against a mask derived from the storage key.
//!
//! The mask is the UTF-16 length of the key, so keys of equal length share a
//! mask. This is obfuscation only and must not be treated as encryption.

use serde_json::Value;

use crate::cache::SENTINEL;
use crate::error::{CacheError, Result};

// == Codec ==
/// Stateless encoder/decoder for stored records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec;

impl Codec {
    /// Creates a new codec.
    pub fn new() -> Self {
        Self
    }

    // == Encode ==
    /// Serializes `value`, obfuscating it against `key` when `obfuscate` is set.
    pub fn encode(&self, key: &str, value: &Value, obfuscate: bool) -> Result<String> {
        let json = serde_json::to_string(value).map_err(|e| CacheError::serialize(key, e))?;
        if !obfuscate {
            return Ok(json);
        }

        let masked = apply_mask(&json, mask_for(key)).map_err(|e| CacheError::serialize(key, e))?;
        let mut record = String::with_capacity(masked.len() + 1);
        record.push(SENTINEL);
        record.push_str(&masked);
        Ok(record)
    }

    // == Decode ==
    /// Parses a stored record, unmasking it first if it carries the sentinel.
    ///
    /// The sentinel alone decides whether unmasking happens; the current
    /// obfuscation setting plays no part.
    pub fn decode(&self, key: &str, text: &str) -> Result<Value> {
        match text.strip_prefix(SENTINEL) {
            Some(masked) => {
                let json =
                    apply_mask(masked, mask_for(key)).map_err(|e| CacheError::decode(key, e))?;
                serde_json::from_str(&json).map_err(|e| CacheError::decode(key, e))
            }
            None => serde_json::from_str(text).map_err(|e| CacheError::decode(key, e)),
        }
    }

    /// Returns true if `text` is an obfuscated record.
    pub fn is_obfuscated(text: &str) -> bool {
        text.starts_with(SENTINEL)
    }
}

/// Mask derived from a storage key: its UTF-16 length, truncated to a code unit.
pub fn mask_for(key: &str) -> u16 {
    (key.encode_utf16().count() & 0xFFFF) as u16
}

/// XORs every UTF-16 code unit of `text` with `mask`. Self-inverse.
///
/// Fails when the result is not valid UTF-16, which only happens for masks
/// large enough to flip a surrogate between its high and low halves.
fn apply_mask(text: &str, mask: u16) -> std::result::Result<String, std::string::FromUtf16Error> {
    let units: Vec<u16> = text.encode_utf16().map(|unit| unit ^ mask).collect();
    String::from_utf16(&units)
}
