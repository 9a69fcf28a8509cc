//! File-based ProgressLedger implementation.

use std::fs;
use std::path::{Path, PathBuf};

use puzzle_core::Fingerprint;

use super::log::RecordLog;
use super::manifest::LedgerManifest;
use crate::repository::union::union_records;
use crate::repository::{Guess, GuessRecord, ProgressLedger, Result, SyncState};
use crate::types::{Generation, GuessId};

/// File-based implementation of ProgressLedger.
///
/// # File Structure
///
/// ```text
/// {base_dir}/
///   ├── manifest.json               ← generation, next id, SyncState (commit point)
///   └── guesses_{generation}.log    ← append-only GuessRecord log
/// ```
///
/// Appends go straight to the live log and are fsynced before returning.
/// `replace_all` writes a complete new generation and then swaps the
/// manifest, so a crash at any point leaves either the old or the new ledger.
/// Records are cached in memory for queries.
pub struct FileLedger {
    base_dir: PathBuf,
    manifest: LedgerManifest,
    log: RecordLog<GuessRecord>,
    records: Vec<GuessRecord>,
}

impl FileLedger {
    /// Open (or initialize) a ledger directory.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;

        let mut manifest = LedgerManifest::load(&base_dir)?.unwrap_or_default();
        let (log, records) =
            RecordLog::<GuessRecord>::open_or_create(log_path(&base_dir, manifest.generation))?;

        // Appends do not rewrite the manifest, so the log may be ahead of it.
        if let Some(max_id) = records.iter().map(|record| record.id).max() {
            manifest.next_id = manifest.next_id.max(max_id + 1);
        }

        remove_stale_logs(&base_dir, manifest.generation)?;

        tracing::info!(
            "Opened ledger {}: {} records, generation {}, next id {}",
            base_dir.display(),
            records.len(),
            manifest.generation,
            manifest.next_id
        );

        Ok(Self {
            base_dir,
            manifest,
            log,
            records,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn generation(&self) -> Generation {
        self.manifest.generation
    }

    /// Path of the log file holding `generation` under `base_dir`.
    pub fn log_path(base_dir: &Path, generation: Generation) -> PathBuf {
        log_path(base_dir, generation)
    }
}

impl ProgressLedger for FileLedger {
    fn append(&mut self, guess: Guess) -> Result<GuessId> {
        let record = GuessRecord::new(self.manifest.next_id, guess);
        self.log.append(&record)?;

        let id = record.id;
        self.records.push(record);
        self.manifest.next_id += 1;

        tracing::debug!("Appended guess[{}]", id);
        Ok(id)
    }

    fn query_by_puzzle(&self, puzzle: &Fingerprint) -> Result<Vec<GuessRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.puzzle() == puzzle)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<GuessRecord>> {
        Ok(self.records.clone())
    }

    fn sync_state(&self) -> Result<SyncState> {
        Ok(self.manifest.sync_state.clone())
    }

    fn replace_all(
        &mut self,
        guesses: Vec<Guess>,
        mut state: SyncState,
    ) -> Result<Vec<GuessRecord>> {
        let mut next_id = self.manifest.next_id;
        let records = union_records(&self.records, guesses, &mut next_id, &mut state);

        // Phase 1: write the complete new generation
        let generation = self.manifest.generation + 1;
        let new_log_path = log_path(&self.base_dir, generation);
        let mut log = RecordLog::<GuessRecord>::create(&new_log_path)?;
        if let Err(error) = log.append_all(records.iter()) {
            discard_log(&new_log_path);
            return Err(error);
        }

        // Phase 2: swap the manifest (commit point)
        let mut manifest = LedgerManifest {
            generation,
            next_id,
            sync_state: state,
            written_at_ms: 0,
        };
        if let Err(error) = manifest.save(&self.base_dir) {
            discard_log(&new_log_path);
            return Err(error);
        }

        let old_log_path = self.log.path().to_path_buf();
        self.log = log;
        self.manifest = manifest;
        self.records = records.clone();
        discard_log(&old_log_path);

        tracing::info!(
            "Replaced ledger contents: {} records, generation {}",
            self.records.len(),
            generation
        );

        Ok(records)
    }

    fn commit_sync_state(&mut self, state: &SyncState) -> Result<()> {
        let mut manifest = self.manifest.clone();
        manifest.sync_state = state.clone();
        manifest.save(&self.base_dir)?;
        self.manifest = manifest;
        Ok(())
    }
}

fn log_path(base_dir: &Path, generation: Generation) -> PathBuf {
    base_dir.join(format!("guesses_{:010}.log", generation))
}

fn discard_log(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!("Failed to remove log {}: {}", path.display(), e);
    }
}

/// Delete log files of generations the manifest does not name.
fn remove_stale_logs(base_dir: &Path, live: Generation) -> Result<()> {
    for entry in fs::read_dir(base_dir)? {
        let path = entry?.path();

        if let Some(filename) = path.file_name().and_then(|s| s.to_str())
            && let Some(generation) = filename
                .strip_prefix("guesses_")
                .and_then(|s| s.strip_suffix(".log"))
                .and_then(|s| s.parse::<Generation>().ok())
            && generation != live
        {
            tracing::warn!("Removing stale ledger log: {}", path.display());
            discard_log(&path);
        }
    }
    Ok(())
}
