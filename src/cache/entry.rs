//! Cache Entry Module
//!
//! Defines the stored record and its JSON form in the medium.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// One stored record: payload plus timing metadata and schema tag.
///
/// Stored as `{"data":…,"createdAt":ms,"expiry":ms,"version":"…"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The stored payload
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Staleness threshold (Unix milliseconds), `created_at + ttl`
    pub expiry: i64,
    /// Schema tag of the build that wrote the entry
    pub version: String,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that goes stale after `ttl`.
    pub fn new(data: T, now_ms: i64, ttl: Duration, version: impl Into<String>) -> Self {
        Self {
            data,
            created_at: now_ms,
            expiry: now_ms.saturating_add(ttl_ms(ttl)),
            version: version.into(),
        }
    }

    // == Is Expired ==
    /// An entry is stale once `now_ms` is strictly past its expiry.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expiry
    }

    /// Timing metadata without the payload.
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            created_at: self.created_at,
            expiry: self.expiry,
        }
    }
}

// == Entry Metadata ==
/// Timing metadata of an entry, readable without decoding the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub created_at: i64,
    pub expiry: i64,
}

impl EntryMetadata {
    /// Milliseconds since the entry was written.
    ///
    /// Timestamps come from the medium and may be garbage, so this saturates.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.created_at)
    }

    /// Milliseconds until the entry goes stale, zero once it has.
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> i64 {
        self.expiry.saturating_sub(now_ms).max(0)
    }
}

/// Lenient view of a stored record used for metadata peeks and pruning.
///
/// Missing or null timing fields read as zero.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTiming {
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub expiry: Option<i64>,
}

impl RawTiming {
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            created_at: self.created_at.unwrap_or(0),
            expiry: self.expiry.unwrap_or(0),
        }
    }
}

/// TTL in whole milliseconds, saturating for absurdly long durations.
pub fn ttl_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}
