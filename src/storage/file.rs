//! File Storage Medium
//!
//! Persists the whole medium as one JSON object so entries survive restarts.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::storage::{item_size, StorageMedium};

// == File Storage ==
/// Persistent medium backed by a JSON file.
///
/// The file is read once on open and rewritten after every mutation. A
/// mutation that cannot be persisted is rolled back in memory.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl FileStorage {
    /// Opens (or lazily creates) the medium at `path` with no quota.
    ///
    /// A missing file is an empty medium; an unreadable one is `Corrupt`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                StorageError::Corrupt(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Opened file storage at {} with {} items", path.display(), items.len());

        Ok(Self {
            path,
            items,
            quota_bytes: None,
        })
    }

    /// Opens the medium at `config.storage_file`, capped at the configured quota.
    ///
    /// Returns None when no file is configured.
    pub fn from_config(config: &Config) -> Option<Result<Self>> {
        config
            .storage_file
            .as_ref()
            .map(|path| Ok(Self::open(path)?.with_quota(config.quota_bytes)))
    }

    /// Caps the medium at `quota_bytes` of keys and values.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes currently charged against the quota.
    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| item_size(k, v)).sum()
    }

    fn persist(&self) -> Result<()> {
        let encoded = serde_json::to_string(&self.items)?;

        // Write then rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageMedium for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        let requested = item_size(key, &value);

        if let Some(quota) = self.quota_bytes {
            let replaced = self.items.get(key).map(|old| item_size(key, old)).unwrap_or(0);
            let available = quota.saturating_sub(self.used_bytes() - replaced);
            if requested > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    requested,
                    available,
                });
            }
        }

        let previous = self.items.insert(key.to_string(), value);
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.items.insert(key.to_string(), old),
                None => self.items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if let Some(old) = self.items.remove(key) {
            if let Err(e) = self.persist() {
                self.items.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.keys().cloned().collect())
    }
}
