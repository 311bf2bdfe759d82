//! Cache Store Module
//!
//! Versioned TTL cache layered over a shared storage medium, with
//! quota-driven pruning. Every medium failure is downgraded to a miss or a
//! dropped write; nothing here returns an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::entry::RawTiming;
use crate::cache::{CacheEntry, CacheKey, CacheStats, EntryMetadata};
use crate::config::Config;
use crate::error::StorageError;
use crate::storage::StorageMedium;
use crate::time::Clock;

// == Write Outcome ==
/// What happened to a best-effort write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written on the first attempt
    Stored,
    /// Written after a prune pass freed space
    StoredAfterPrune { pruned: usize },
    /// Abandoned; the previous entry, if any, is left as it was
    Dropped,
}

impl WriteOutcome {
    // == Is Stored ==
    /// True unless the write was dropped.
    pub fn is_stored(self) -> bool {
        !matches!(self, WriteOutcome::Dropped)
    }
}

// == Cache Store ==
/// Expiry-aware cache owning every key under its prefix in the medium.
pub struct CacheStore<M: StorageMedium> {
    /// Underlying key-value medium
    medium: M,
    /// Source of "now" for timestamps and expiry checks
    clock: Arc<dyn Clock>,
    /// Namespace prefix separating our keys from other data in the medium
    prefix: String,
    /// Schema tag; entries written under another tag are discarded on read
    version: String,
    /// Share of namespace entries removed per prune pass
    prune_percent: u8,
    /// Performance statistics
    stats: CacheStats,
}

impl<M: StorageMedium> CacheStore<M> {
    // == Constructor ==
    /// Creates a store over `medium` for the namespace `prefix`.
    ///
    /// # Arguments
    /// * `medium` - Storage medium, possibly shared with other data
    /// * `prefix` - Namespace prefix prepended to every key
    /// * `version` - Current schema tag
    /// * `clock` - Time authority used for all timestamps
    pub fn new(
        medium: M,
        prefix: impl Into<String>,
        version: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            medium,
            clock,
            prefix: prefix.into(),
            version: version.into(),
            prune_percent: super::DEFAULT_PRUNE_PERCENT,
            stats: CacheStats::new(),
        }
    }

    /// Creates a store using the namespace, version and prune share of `config`.
    pub fn from_config(config: &Config, medium: M, clock: Arc<dyn Clock>) -> Self {
        Self::new(medium, config.prefix.clone(), config.version.clone(), clock)
            .with_prune_percent(config.prune_percent)
    }

    /// Sets the share of entries a prune pass removes, clamped to 1..=100.
    pub fn with_prune_percent(mut self, percent: u8) -> Self {
        self.prune_percent = percent.clamp(1, 100);
        self
    }

    // == Get ==
    /// Returns the fresh payload stored under `key`.
    ///
    /// Expired entries read as absent but stay in the medium for `get_stale`.
    /// Entries from another version, or that cannot be decoded as `T`, are
    /// deleted.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.read(key, false)
    }

    // == Get Stale ==
    /// Returns the payload stored under `key`, ignoring expiry.
    ///
    /// Meant for fallback paths when a live fetch has failed.
    pub fn get_stale<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.read(key, true)
    }

    fn read<T: DeserializeOwned>(&mut self, key: &str, ignore_expiry: bool) -> Option<T> {
        let storage_key = self.storage_key(key);

        let raw = match self.medium.get_item(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss: {}", key);
                self.stats.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Cache read error for {}: {}", key, e);
                self.stats.record_miss();
                return None;
            }
        };

        let entry: CacheEntry<Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding corrupt cache entry {}: {}", key, e);
                self.invalidate(&storage_key);
                return None;
            }
        };

        if entry.version != self.version {
            debug!(
                "Discarding cache entry {} with version {} (current {})",
                key, entry.version, self.version
            );
            self.invalidate(&storage_key);
            return None;
        }

        let expired = entry.is_expired_at(self.clock.now_ms());
        if expired && !ignore_expiry {
            debug!("Cache entry expired: {}", key);
            self.stats.record_miss();
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(data) => {
                if expired {
                    self.stats.record_stale_hit();
                } else {
                    self.stats.record_hit();
                }
                Some(data)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                self.invalidate(&storage_key);
                None
            }
        }
    }

    // == Set ==
    /// Stores `data` under `key` for `ttl`, replacing any previous entry.
    ///
    /// Best-effort: on a quota failure one prune pass runs and the write is
    /// retried once. Any remaining failure is logged and swallowed.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, data: &T, ttl: Duration) -> WriteOutcome {
        let storage_key = self.storage_key(key);

        let err = match self.write_entry(&storage_key, data, ttl) {
            Ok(()) => return WriteOutcome::Stored,
            Err(e) => e,
        };

        if !err.is_quota_exceeded() {
            warn!("Cache write error for {}: {}", key, err);
            self.stats.record_dropped_write();
            return WriteOutcome::Dropped;
        }

        warn!("Cache write error for {} ({}), pruning", key, err);
        let pruned = self.prune();

        match self.write_entry(&storage_key, data, ttl) {
            Ok(()) => WriteOutcome::StoredAfterPrune { pruned },
            Err(e) => {
                error!("Cache write for {} failed after pruning: {}", key, e);
                self.stats.record_dropped_write();
                WriteOutcome::Dropped
            }
        }
    }

    /// Stores `data` under `key` with the TTL of the key's resource class.
    pub fn set_resource<T: Serialize + ?Sized>(&mut self, key: &CacheKey, data: &T) -> WriteOutcome {
        self.set(key.as_str(), data, key.ttl())
    }

    fn write_entry<T: Serialize + ?Sized>(
        &mut self,
        storage_key: &str,
        data: &T,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let entry = CacheEntry::new(data, self.clock.now_ms(), ttl, self.version.as_str());
        let encoded = serde_json::to_string(&entry)?;
        self.medium.set_item(storage_key, encoded)
    }

    // == Metadata ==
    /// Peeks at the timing metadata of `key` without checking version or expiry.
    ///
    /// Missing timing fields read as zero.
    pub fn metadata(&self, key: &str) -> Option<EntryMetadata> {
        let raw = self.medium.get_item(&self.storage_key(key)).ok().flatten()?;
        serde_json::from_str::<RawTiming>(&raw)
            .ok()
            .map(|timing| timing.metadata())
    }

    // == Remove ==
    /// Deletes `key`. Removing a missing key is a no-op.
    pub fn remove(&mut self, key: &str) {
        if let Err(e) = self.medium.remove_item(&self.storage_key(key)) {
            warn!("Cache remove error for {}: {}", key, e);
        }
    }

    // == Prune ==
    /// Removes the entries closest to expiry from this namespace.
    ///
    /// Entries are ordered by absolute expiry, with unreadable ones first, and
    /// the lowest `ceil(n * percent / 100)` are deleted. Keys outside the
    /// prefix are never touched. Returns the number removed.
    pub fn prune(&mut self) -> usize {
        let keys = match self.namespace_keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!("Failed to prune cache: {}", e);
                return 0;
            }
        };

        let mut candidates: Vec<(i64, String)> = keys
            .into_iter()
            .map(|key| (self.stored_expiry(&key), key))
            .collect();
        // Key as tie-break keeps the order independent of medium iteration order
        candidates.sort();

        let target = prune_count(candidates.len(), self.prune_percent);
        let mut removed = 0;

        for (_, key) in candidates.into_iter().take(target) {
            match self.medium.remove_item(&key) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to prune {}: {}", key, e),
            }
        }

        self.stats.record_prune(removed);
        info!("Cache pruned: {} items removed", removed);
        removed
    }

    fn stored_expiry(&self, storage_key: &str) -> i64 {
        self.medium
            .get_item(storage_key)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str::<RawTiming>(&raw).ok())
            .and_then(|timing| timing.expiry)
            .unwrap_or(0)
    }

    // == Length ==
    /// Number of entries in this store's namespace.
    pub fn len(&self) -> usize {
        self.namespace_keys().map(|keys| keys.len()).unwrap_or(0)
    }

    /// Returns true if this store's namespace holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Accessors ==
    /// Schema tag written into new entries.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Namespace prefix of this store's keys.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Time authority used for timestamps and expiry checks.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Underlying medium, shared with whatever else lives in it.
    pub fn medium(&self) -> &M {
        &self.medium
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn namespace_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .medium
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(&self.prefix))
            .collect())
    }

    fn invalidate(&mut self, storage_key: &str) {
        self.stats.record_invalidation();
        self.stats.record_miss();
        if let Err(e) = self.medium.remove_item(storage_key) {
            warn!("Failed to remove invalid cache entry {}: {}", storage_key, e);
        }
    }
}

/// Number of entries a prune pass removes: `ceil(total * percent / 100)`.
pub fn prune_count(total: usize, percent: u8) -> usize {
    (total * usize::from(percent)).div_ceil(100)
}
