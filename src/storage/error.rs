//! Error types for the key-value store.

use thiserror::Error;

/// Errors that can occur while reading or writing persisted blobs.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium failed (file system, permissions, ...).
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blob could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The write would exceed the store's capacity.
    #[error("Storage quota exceeded writing {key}: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
}
