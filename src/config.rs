//! Configuration Module
//!
//! Handles loading cache and clock settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{CACHE_VERSION, DEFAULT_PREFIX, DEFAULT_PRUNE_PERCENT};

/// Default medium capacity, matching the usual browser local-storage budget.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Cache and clock configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace prefix for this store's keys in the medium
    pub prefix: String,
    /// Current schema/version tag written into every entry
    pub version: String,
    /// Capacity of the storage medium in bytes
    pub quota_bytes: usize,
    /// Percentage of namespace entries removed by one prune pass
    pub prune_percent: u8,
    /// Path of the persistent JSON medium, if any
    pub storage_file: Option<PathBuf>,
    /// Match clock polling interval in milliseconds
    pub tick_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PREFIX` - Key namespace (default: `pronosia_cache_`)
    /// - `CACHE_VERSION` - Schema tag (default: `v3_api_football`)
    /// - `CACHE_QUOTA_BYTES` - Medium capacity (default: 5 MiB)
    /// - `CACHE_PRUNE_PERCENT` - Prune share, 1..=100 (default: 30)
    /// - `CACHE_FILE` - Persistent medium path (default: unset)
    /// - `CLOCK_TICK_MS` - Match clock interval (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            prefix: env::var("CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.prefix),
            version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.version),
            quota_bytes: env::var("CACHE_QUOTA_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.quota_bytes),
            prune_percent: env::var("CACHE_PRUNE_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|p| (1..=100).contains(p))
                .unwrap_or(defaults.prune_percent),
            storage_file: env::var_os("CACHE_FILE").map(PathBuf::from),
            tick_ms: env::var("CLOCK_TICK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.tick_ms),
        }
    }

    /// Match clock polling interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            version: CACHE_VERSION.to_string(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            prune_percent: DEFAULT_PRUNE_PERCENT,
            storage_file: None,
            tick_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.prefix, "pronosia_cache_");
        assert_eq!(config.version, "v3_api_football");
        assert_eq!(config.quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.prune_percent, 30);
        assert!(config.storage_file.is_none());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_PREFIX");
        env::remove_var("CACHE_VERSION");
        env::remove_var("CACHE_QUOTA_BYTES");
        env::remove_var("CACHE_PRUNE_PERCENT");
        env::remove_var("CACHE_FILE");
        env::remove_var("CLOCK_TICK_MS");

        let config = Config::from_env();
        assert_eq!(config.prefix, "pronosia_cache_");
        assert_eq!(config.version, "v3_api_football");
        assert_eq!(config.quota_bytes, DEFAULT_QUOTA_BYTES);
        assert_eq!(config.prune_percent, 30);
        assert_eq!(config.tick_ms, 1000);
    }
}
