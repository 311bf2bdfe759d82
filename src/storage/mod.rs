//! Storage Module
//!
//! The synchronous string key-value medium the cache is layered over.
//!
//! # Media
//! - `MemoryStorage`: shared in-memory map with a byte quota
//! - `FileStorage`: persistent map stored as one JSON object file

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

// == Storage Medium ==
/// A finite string-keyed store that may reject writes when full.
///
/// Several cache namespaces, and unrelated application data, may share one
/// medium, so implementations must only touch the key they are given.
pub trait StorageMedium {
    /// Returns the raw value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Removing a missing key succeeds.
    fn remove_item(&mut self, key: &str) -> Result<()>;

    /// Lists every key currently held by the medium.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Bytes charged against a quota for one item.
pub(crate) fn item_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
