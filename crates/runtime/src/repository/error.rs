//! Error types raised by ledger implementations.

use thiserror::Error;

/// Errors surfaced by ledger implementations.
///
/// Any of these leaves the ledger exactly as it was before the failed call.
/// Callers retry with backoff.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("ledger lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
