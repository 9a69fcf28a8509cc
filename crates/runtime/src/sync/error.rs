//! Errors raised while reconciling with the snapshot service.

use thiserror::Error;

/// Remote snapshot blob could not be read.
///
/// Only fatal to a sync for [`DecodeError::UnsupportedVersion`] above the
/// current format. Otherwise the remote is treated as empty so local progress
/// is kept, and the condition is logged.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u64),

    #[error("unrecognized snapshot shape: {0}")]
    UnrecognizedShape(&'static str),

    #[error("snapshot declares {expected} guesses but contains {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid guess at index {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("guess at index {index} has an empty puzzle fingerprint")]
    EmptyFingerprint { index: usize },
}

/// Transport failure reported by the snapshot service.
///
/// Retries happen inside the service boundary; the core only propagates.
#[derive(Debug, Clone, Error)]
#[error("snapshot service error: {message}")]
pub struct NetworkError {
    pub message: String,
    pub retryable: bool,
}

impl NetworkError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

/// Failure of one reconciliation attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Conflict resolution hit its retry ceiling. Safe to retry the whole
    /// sync later since merging is idempotent.
    #[error("snapshot conflicts still unresolved after {attempts} attempts")]
    ConflictExhausted { attempts: u32 },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The remote snapshot was written by a newer client. Committing over it
    /// would discard guesses this client cannot read, so the sync stops.
    #[error("snapshot format version {version} is newer than this client supports")]
    NewerSnapshotFormat { version: u64 },
}
