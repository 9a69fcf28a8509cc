//! Reconciliation with the remote snapshot service.
//!
//! - [`codec`] maps guesses to and from the remote blob
//! - [`store`] is the snapshot service boundary
//! - [`resolver`] merges and commits with bounded conflict retries
//! - [`coordinator`] runs a full sync against a [`ProgressHandle`]
//!
//! [`ProgressHandle`]: crate::api::ProgressHandle

pub mod codec;
pub mod coordinator;
pub mod error;
pub mod resolver;
pub mod store;

pub use codec::{SNAPSHOT_FORMAT_VERSION, SnapshotCodec};
pub use coordinator::{SyncCoordinator, SyncOutcome};
pub use error::{DecodeError, NetworkError, SyncError};
pub use resolver::{ConflictResolver, Reconciled, merge};
pub use store::{
    CommitOutcome, InMemorySnapshotStore, OpenOutcome, RemoteSnapshot, SnapshotConflict,
    SnapshotMetadata, SnapshotStore,
};
