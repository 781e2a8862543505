//! Cache Module
//!
//! Provides the stash engine: merge-on-write, record obfuscation and timed expiry
//! over a pluggable storage area.

mod codec;
mod engine;
mod merge;
mod stats;


use std::time::Duration;

// Re-export public types
pub use codec::{mask_for, Codec};
pub use engine::{CacheEngine, SetOptions};
pub use merge::{is_truthy, merge};
pub use stats::CacheStats;

// == Public Constants ==
/// Key used when the caller does not name one
pub const DEFAULT_KEY: &str = "default-key";

/// Leading character of an obfuscated record
pub const SENTINEL: char = '#';

/// Expiry delay used when a write does not specify one
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_millis(60 * 1000);
