//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod clean;
mod decode_snapshot;
mod read_ledger;
mod stats;

pub use clean::Clean;
pub use decode_snapshot::DecodeSnapshot;
pub use read_ledger::ReadLedger;
pub use stats::Stats;
