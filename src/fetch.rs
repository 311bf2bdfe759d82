//! Read-Through Fetching
//!
//! The cache-first, stale-on-error pattern used by every upstream fetcher:
//! serve a fresh cached value when there is one, otherwise fetch and store,
//! and if the fetch fails fall back to whatever expired copy is left.
//!
//! The store is shared behind a `tokio::sync::RwLock`; the lock is released
//! while the fetch is in flight.

use std::fmt::Display;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStore, EntryMetadata};
use crate::storage::StorageMedium;

/// A prediction kicking off within this window is imminent.
pub const IMMINENT_BEFORE_KICKOFF_HOURS: i64 = 3;
/// A prediction is still imminent this long after kickoff.
pub const IMMINENT_AFTER_KICKOFF_HOURS: i64 = 2;
/// Imminent predictions older than this are refetched.
pub const IMMINENT_MAX_AGE_MINUTES: i64 = 30;

// == Value Source ==
/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Fresh cache entry
    Cache,
    /// Upstream fetch, now cached
    Fetched,
    /// Expired cache entry served because the fetch failed
    Stale,
}

/// A value together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Fetched<T> {
    /// True when the value may be out of date and the UI should say so.
    pub fn is_stale(&self) -> bool {
        self.source == ValueSource::Stale
    }
}

// == Fetch Through ==
/// Returns the cached value for `key`, or fetches, stores and returns it.
///
/// With `force_refresh` the cache is not consulted before fetching. A failed
/// fetch falls back to the expired entry when one exists; otherwise the
/// fetch error is returned.
pub async fn fetch_through<M, T, E, F, Fut>(
    cache: &RwLock<CacheStore<M>>,
    key: &CacheKey,
    force_refresh: bool,
    fetch: F,
) -> Result<Fetched<T>, E>
where
    M: StorageMedium,
    T: Serialize + DeserializeOwned,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    read_through(cache, key, force_refresh, |_, _| false, fetch).await
}

// == Fetch Prediction ==
/// Like [`fetch_through`], but refreshes a still-valid prediction for a
/// match that is about to start once the cached copy is 30 minutes old, so
/// late line-up and injury news is picked up.
pub async fn fetch_prediction<M, T, E, F, Fut>(
    cache: &RwLock<CacheStore<M>>,
    key: &CacheKey,
    kickoff: DateTime<Utc>,
    force_refresh: bool,
    fetch: F,
) -> Result<Fetched<T>, E>
where
    M: StorageMedium,
    T: Serialize + DeserializeOwned,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    read_through(
        cache,
        key,
        force_refresh,
        |meta, now| needs_refresh(meta, kickoff, now),
        fetch,
    )
    .await
}

/// Smart invalidation rule for predictions.
///
/// True when kickoff is less than 3 hours away (or under 2 hours past) and
/// the entry was written more than 30 minutes ago.
pub fn needs_refresh(meta: &EntryMetadata, kickoff: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let to_kickoff = kickoff - now;
    let imminent = to_kickoff < Duration::hours(IMMINENT_BEFORE_KICKOFF_HOURS)
        && to_kickoff > -Duration::hours(IMMINENT_AFTER_KICKOFF_HOURS);
    let age_ms = meta.age_ms(now.timestamp_millis());

    imminent && age_ms > Duration::minutes(IMMINENT_MAX_AGE_MINUTES).num_milliseconds()
}

async fn read_through<M, T, E, F, Fut, R>(
    cache: &RwLock<CacheStore<M>>,
    key: &CacheKey,
    force_refresh: bool,
    revalidate: R,
    fetch: F,
) -> Result<Fetched<T>, E>
where
    M: StorageMedium,
    T: Serialize + DeserializeOwned,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnOnce(&EntryMetadata, DateTime<Utc>) -> bool,
{
    if !force_refresh {
        let mut store = cache.write().await;
        if let Some(value) = store.get::<T>(key.as_str()) {
            let now = store.clock().now();
            let outdated = store
                .metadata(key.as_str())
                .map(|meta| revalidate(&meta, now))
                .unwrap_or(false);

            if !outdated {
                debug!("Serving {} from cache", key);
                return Ok(Fetched {
                    value,
                    source: ValueSource::Cache,
                });
            }
            info!("Smart invalidation: refreshing {}", key);
        }
    }

    match fetch().await {
        Ok(value) => {
            cache.write().await.set_resource(key, &value);
            Ok(Fetched {
                value,
                source: ValueSource::Fetched,
            })
        }
        Err(e) => {
            warn!("Fetch for {} failed: {}", key, e);
            match cache.write().await.get_stale::<T>(key.as_str()) {
                Some(value) => {
                    warn!("Returning stale cache for {}", key);
                    Ok(Fetched {
                        value,
                        source: ValueSource::Stale,
                    })
                }
                None => Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::time::{Clock, ManualClock};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn setup() -> (RwLock<CacheStore<MemoryStorage>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
        ));
        let store = CacheStore::new(MemoryStorage::new(64 * 1024), "t_", "v1", clock.clone());
        (RwLock::new(store), clock)
    }

    #[tokio::test]
    async fn test_fetch_then_cache_hit() {
        let (cache, _) = setup();
        let key = CacheKey::news();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let first = fetch_through(&cache, &key, false, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec!["headline".to_string()])
        })
        .await
        .unwrap();
        assert_eq!(first.source, ValueSource::Fetched);

        let second = fetch_through(&cache, &key, false, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec!["other".to_string()])
        })
        .await
        .unwrap();
        assert_eq!(second.source, ValueSource::Cache);
        assert_eq!(second.value, vec!["headline".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let (cache, _) = setup();
        let key = CacheKey::standing(61);
        cache.write().await.set_resource(&key, &1u32);

        let result = fetch_through(&cache, &key, true, || async { Ok::<_, String>(2u32) })
            .await
            .unwrap();
        assert_eq!(result, Fetched { value: 2, source: ValueSource::Fetched });
        assert_eq!(cache.write().await.get::<u32>(key.as_str()), Some(2));
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_stale() {
        let (cache, clock) = setup();
        let key = CacheKey::upcoming_matches();
        cache.write().await.set_resource(&key, &vec![7u32]);
        clock.advance(Duration::minutes(5));

        let result = fetch_through(&cache, &key, false, || async {
            Err::<Vec<u32>, _>("upstream down".to_string())
        })
        .await
        .unwrap();
        assert!(result.is_stale());
        assert_eq!(result.value, vec![7]);
    }

    #[tokio::test]
    async fn test_failed_fetch_without_cache_errors() {
        let (cache, _) = setup();
        let key = CacheKey::combo(2.0);

        let result = fetch_through(&cache, &key, false, || async {
            Err::<u32, _>("upstream down".to_string())
        })
        .await;
        assert_eq!(result.unwrap_err(), "upstream down");
    }

    #[test]
    fn test_needs_refresh_rule() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap();
        let written = |minutes_ago: i64| EntryMetadata {
            created_at: (now - Duration::minutes(minutes_ago)).timestamp_millis(),
            expiry: i64::MAX,
        };

        // Imminent and old
        assert!(needs_refresh(&written(31), now + Duration::hours(2), now));
        // Live and old
        assert!(needs_refresh(&written(31), now - Duration::hours(1), now));
        // Imminent but recent
        assert!(!needs_refresh(&written(10), now + Duration::hours(2), now));
        // Far away
        assert!(!needs_refresh(&written(600), now + Duration::hours(5), now));
        // Long over
        assert!(!needs_refresh(&written(600), now - Duration::hours(3), now));

        // Out-of-range timestamps from the medium
        let ancient = EntryMetadata {
            created_at: i64::MIN,
            expiry: i64::MAX,
        };
        assert!(needs_refresh(&ancient, now + Duration::hours(1), now));
        let from_the_future = EntryMetadata {
            created_at: i64::MAX,
            expiry: i64::MAX,
        };
        assert!(!needs_refresh(&from_the_future, now + Duration::hours(1), now));
    }

    #[tokio::test]
    async fn test_prediction_with_corrupt_timestamp_is_refetched() {
        let (cache, clock) = setup();
        let key = CacheKey::prediction("1");
        let kickoff = clock.now() + Duration::hours(1);

        let mut medium = cache.read().await.medium().clone();
        medium
            .set_item(
                "t_pred_1",
                r#"{"data":"x","createdAt":-9223372036854775808,"expiry":9223372036854775807,"version":"v1"}"#
                    .to_string(),
            )
            .unwrap();

        let result = fetch_prediction(&cache, &key, kickoff, false, || async {
            Ok::<_, String>("fresh".to_string())
        })
        .await
        .unwrap();
        assert_eq!(result, Fetched { value: "fresh".to_string(), source: ValueSource::Fetched });
        assert_eq!(cache.write().await.get::<String>(key.as_str()).as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_prediction_smart_invalidation() {
        let (cache, clock) = setup();
        let key = CacheKey::prediction("42");
        let kickoff = clock.now() + Duration::hours(2);
        cache.write().await.set_resource(&key, "old analysis");

        // Fresh enough: served from cache
        clock.advance(Duration::minutes(10));
        let result = fetch_prediction(&cache, &key, kickoff, false, || async {
            Ok::<_, String>("new analysis".to_string())
        })
        .await
        .unwrap();
        assert_eq!(result.source, ValueSource::Cache);

        // Older than 30 minutes with kickoff close: refetched
        clock.advance(Duration::minutes(25));
        let result = fetch_prediction(&cache, &key, kickoff, false, || async {
            Ok::<_, String>("new analysis".to_string())
        })
        .await
        .unwrap();
        assert_eq!(result.source, ValueSource::Fetched);
        assert_eq!(result.value, "new analysis");
    }
}
