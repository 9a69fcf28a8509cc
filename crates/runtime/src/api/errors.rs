//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the ledger worker, storage, sync and reporting so
//! callers can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::StorageError;
pub use crate::sync::SyncError;

use super::reporter::ReportError;

pub type Result<T> = std::result::Result<T, ProgressError>;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("ledger worker command channel closed")]
    CommandChannelClosed,

    #[error("ledger worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("ledger worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl ProgressError {
    /// Whether retrying the same operation later can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProgressError::Storage(_) => true,
            ProgressError::Sync(SyncError::ConflictExhausted { .. }) => true,
            ProgressError::Sync(SyncError::Network(e)) => e.retryable,
            ProgressError::Sync(SyncError::Encode(_))
            | ProgressError::Sync(SyncError::NewerSnapshotFormat { .. }) => false,
            ProgressError::Report(e) => e.retryable,
            ProgressError::CommandChannelClosed
            | ProgressError::ReplyChannelClosed(_)
            | ProgressError::WorkerJoin(_) => false,
        }
    }
}
