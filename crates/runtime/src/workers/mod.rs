//! Worker tasks that back the runtime orchestration.
//!
//! The ledger worker is the single writer of a player's progress ledger.

mod ledger;

pub use ledger::{Command, LedgerWorker, Submission};
