//! In-memory ledger implementation for testing and development.

mod ledger;

pub use ledger::InMemoryLedger;
