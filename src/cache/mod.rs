//! Cache Module
//!
//! Versioned TTL cache over a storage medium, with quota-driven pruning.

mod entry;
mod keys;
mod stats;
mod store;


// Re-export public types
pub use entry::{ttl_ms, CacheEntry, EntryMetadata};
pub use keys::{CacheKey, ResourceClass};
pub use stats::CacheStats;
pub use store::{prune_count, CacheStore, WriteOutcome};

// == Public Constants ==
/// Default namespace prefix for cache keys in the medium
pub const DEFAULT_PREFIX: &str = "pronosia_cache_";

/// Schema tag of this build's entries
pub const CACHE_VERSION: &str = "v3_api_football";

/// Default share of namespace entries removed per prune pass
pub const DEFAULT_PRUNE_PERCENT: u8 = 30;
