//! Runtime for a daily word-puzzle player's progress.
//!
//! This crate wires the local progress ledger, the remote snapshot sync and
//! the counter aggregation into one runtime API. Consumers build a
//! [`ProgressRuntime`], submit guesses through [`ProgressHandle`], and run
//! [`SyncCoordinator::sync`] to merge with other devices and report progress.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`repository`] provides the ledger trait and its backends
//! - [`sync`] reconciles with the remote snapshot service
//! - [`aggregate`] folds the ledger into reportable counters
//! - [`workers`] keeps background tasks internal to the crate
pub mod aggregate;
pub mod api;
pub mod config;
pub mod repository;
pub mod runtime;
pub mod sync;
pub mod types;

mod workers;

pub use aggregate::{Aggregation, AggregationReport, aggregate, longest_run};
pub use api::{
    InMemoryReporter, ProgressError, ProgressHandle, ProgressReporter, ReportError, Result,
};
pub use config::ProgressConfig;
pub use repository::{
    Counter, CounterKind, CounterUpdate, FileLedger, Guess, GuessRecord, InMemoryLedger,
    PendingUpdate, ProgressLedger, PuzzleHistoryEntry, StorageError, SyncState,
};
pub use runtime::{ProgressRuntime, ProgressRuntimeBuilder};
pub use sync::{
    ConflictResolver, DecodeError, InMemorySnapshotStore, NetworkError, SnapshotCodec,
    SnapshotStore, SyncCoordinator, SyncError, SyncOutcome,
};
pub use workers::Submission;
