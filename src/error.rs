//! Error types for the storage boundary
//!
//! Provides unified error handling using thiserror. Nothing above the
//! storage medium returns these to callers: the cache store downgrades them
//! to misses and dropped writes.

use thiserror::Error;

// == Storage Error Enum ==
/// Failure raised by a storage medium.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Write rejected because the medium is out of space
    #[error("Quota exceeded writing {key}: requested {requested} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        requested: usize,
        available: usize,
    },

    /// Medium is disabled or blocked
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Backing file could not be read or written
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing data could not be decoded
    #[error("Storage corrupt: {0}")]
    Corrupt(String),

    /// Value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Returns true when the failure is a capacity problem that pruning can fix.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for storage media.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_detection() {
        let err = StorageError::QuotaExceeded {
            key: "k".to_string(),
            requested: 10,
            available: 2,
        };
        assert!(err.is_quota_exceeded());
        assert!(!StorageError::Unavailable("blocked".to_string()).is_quota_exceeded());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StorageError = io.into();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }
}
