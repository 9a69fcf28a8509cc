//! Repository layer for the local progress ledger.
//!
//! The ledger is the only durable state the runtime owns:
//! - Guess records (append-only, per device ids)
//! - Sync bookkeeping ([`SyncState`])
//!
//! Puzzle content is never stored here; it arrives as values from outside.

mod error;
mod file;
mod memory;
mod traits;
mod types;
mod union;

pub use error::{Result, StorageError};
pub use file::{FileLedger, LedgerManifest, RecordLog, read_records};
pub use memory::InMemoryLedger;
pub use traits::ProgressLedger;
pub use types::{
    Counter, CounterKind, CounterUpdate, Guess, GuessRecord, PendingUpdate, PuzzleHistoryEntry,
    SyncState,
};
