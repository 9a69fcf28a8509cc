//! Ledger manifest: the commit point of the file ledger.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::repository::{Result, StorageError, SyncState};
use crate::types::{Generation, GuessId, TimestampMs, current_timestamp_ms};

const MANIFEST_FILE: &str = "manifest.json";

/// Small JSON document naming the live log generation and holding the
/// player's [`SyncState`].
///
/// # 2-Phase Commit
///
/// `replace_all` writes the new generation's log first and the manifest
/// last. Whatever the manifest names is the ledger; a log file it does not
/// name is leftover from an interrupted write and is deleted on open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerManifest {
    /// Generation of the live `guesses_{generation}.log`
    pub generation: Generation,

    /// Lower bound for the next guess id
    pub next_id: GuessId,

    pub sync_state: SyncState,

    /// When this manifest was written
    pub written_at_ms: TimestampMs,
}

impl LedgerManifest {
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(MANIFEST_FILE)
    }

    /// Load the manifest, or `None` for a fresh ledger directory.
    pub fn load(base_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(base_dir);

        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        let manifest: Self =
            serde_json::from_str(&json).map_err(|e| StorageError::Json(e.to_string()))?;

        tracing::debug!(
            "Loaded ledger manifest: generation={}, next_id={}, counted={}",
            manifest.generation,
            manifest.next_id,
            manifest.sync_state.counted.len()
        );

        Ok(Some(manifest))
    }

    /// Write the manifest atomically (temp file + fsync + rename).
    pub fn save(&mut self, base_dir: &Path) -> Result<()> {
        self.written_at_ms = current_timestamp_ms();

        let path = Self::path(base_dir);
        let temp_path = path.with_extension("json.tmp");

        let json =
            serde_json::to_string_pretty(self).map_err(|e| StorageError::Json(e.to_string()))?;

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        tracing::debug!(
            "Saved ledger manifest: generation={}, next_id={}",
            self.generation,
            self.next_id
        );

        Ok(())
    }
}
