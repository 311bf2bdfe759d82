//! In-Memory Storage Medium
//!
//! A shared map with a byte quota, standing in for browser-style local storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::storage::{item_size, StorageMedium};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, String>,
    used_bytes: usize,
    pending_write_failures: usize,
}

// == Memory Storage ==
/// Cloneable handle onto one in-memory medium.
///
/// Clones share the same data, so two cache stores with different prefixes
/// (or a store and unrelated application code) can sit on one medium.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
    quota_bytes: usize,
    available: bool,
}

impl MemoryStorage {
    /// Creates an empty medium holding at most `quota_bytes` of keys and values.
    pub fn new(quota_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            quota_bytes,
            available: true,
        }
    }

    /// Creates an empty medium sized by `config.quota_bytes`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.quota_bytes)
    }

    /// Creates a medium that rejects every operation, like disabled storage.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0)
        }
    }

    /// Makes the next `count` writes fail with a quota error regardless of space.
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().pending_write_failures = count;
    }

    /// Bytes currently charged against the quota.
    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes
    }

    /// Configured capacity in bytes.
    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }

    /// Number of items held, across all namespaces.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns true if the medium holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still structurally valid
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory storage disabled".to_string()))
        }
    }
}

impl StorageMedium for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.lock().items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.check_available()?;
        let quota = self.quota_bytes;
        let mut inner = self.lock();

        let requested = item_size(key, &value);
        let replaced = inner
            .items
            .get(key)
            .map(|old| item_size(key, old))
            .unwrap_or(0);
        let available = quota.saturating_sub(inner.used_bytes - replaced);

        if inner.pending_write_failures > 0 {
            inner.pending_write_failures -= 1;
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                requested,
                available,
            });
        }

        if requested > available {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                requested,
                available,
            });
        }

        inner.used_bytes = inner.used_bytes - replaced + requested;
        inner.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.check_available()?;
        let mut inner = self.lock();
        if let Some(old) = inner.items.remove(key) {
            inner.used_bytes -= item_size(key, &old);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.check_available()?;
        Ok(self.lock().items.keys().cloned().collect())
    }
}
