//! Utility functions for xtask commands

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use progress_runtime::repository::{LedgerManifest, read_records};
use progress_runtime::{CounterKind, CounterUpdate, FileLedger, GuessRecord};

/// Read a ledger directory without modifying it.
///
/// Unlike opening a [`FileLedger`], this never truncates a torn tail or
/// removes stale generation logs.
pub fn load_ledger(dir: &Path) -> Result<(LedgerManifest, Vec<GuessRecord>)> {
    if !dir.exists() {
        return Err(anyhow!(
            "Ledger directory does not exist: {}\n\
             Record a guess first to create it.",
            dir.display()
        ));
    }

    let manifest = LedgerManifest::load(dir)
        .with_context(|| format!("Failed to read manifest in {}", dir.display()))?
        .unwrap_or_default();

    let log_path = FileLedger::log_path(dir, manifest.generation);
    if !log_path.exists() {
        return Ok((manifest, Vec::new()));
    }

    let (records, _) = read_records::<GuessRecord>(&log_path)
        .with_context(|| format!("Failed to read ledger log: {}", log_path.display()))?;

    Ok((manifest, records))
}

/// `+N` for increments, `max N` for best-value counters.
pub fn format_update(update: &CounterUpdate) -> String {
    match update.counter.kind() {
        CounterKind::Increment => format!("{:<14} +{}", update.counter, update.value),
        CounterKind::Maximum => format!("{:<14} max {}", update.counter, update.value),
    }
}
