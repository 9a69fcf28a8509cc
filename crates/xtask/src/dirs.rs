//! Directory resolution for ledger commands
//!
//! Resolves the same locations the runtime uses, so `PROGRESS_DATA_DIR` and
//! `PROGRESS_PLAYER_ID` (from the environment or `.env`) apply here too.

use std::path::PathBuf;

use progress_runtime::ProgressConfig;

/// Root data directory: explicit override, else runtime configuration.
pub fn data_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| ProgressConfig::from_env().data_dir)
}

/// Ledger directory of one player.
pub fn ledger_dir(override_dir: Option<PathBuf>, player: Option<String>) -> PathBuf {
    let mut config = ProgressConfig::from_env().with_data_dir(data_dir(override_dir));
    if let Some(player) = player {
        config = config.with_player_id(player);
    }
    config.ledger_dir()
}
