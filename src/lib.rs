//! Prono Cache - client-side caching and time authority for match data
//!
//! A versioned, TTL-based cache layered over a shared key-value storage
//! medium with quota-aware pruning, plus the server-time clock and the match
//! status, countdown and betting-window rules derived from it.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod storage;
pub mod tasks;
pub mod telemetry;
pub mod time;

pub use cache::{CacheKey, CacheStore, ResourceClass, WriteOutcome};
pub use config::Config;
pub use error::StorageError;
pub use fetch::{fetch_prediction, fetch_through, Fetched, ValueSource};
pub use storage::{FileStorage, MemoryStorage, StorageMedium};
pub use tasks::{spawn_match_clock, spawn_match_clock_from_config};
pub use time::{Clock, ManualClock, MatchStatus, SystemClock};
