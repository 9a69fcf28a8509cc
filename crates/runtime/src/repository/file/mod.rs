//! File-based ledger implementation.

mod ledger;
mod log;
mod manifest;

pub use ledger::FileLedger;
pub use log::{RecordLog, read_records};
pub use manifest::LedgerManifest;
