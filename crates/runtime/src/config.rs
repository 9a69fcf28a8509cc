//! Runtime configuration and loaders.
use std::env;
use std::path::PathBuf;

use crate::types::PlayerId;

const APP_NAME: &str = "word-puzzle";

/// Configuration for a player's progress runtime.
#[derive(Clone, Debug)]
pub struct ProgressConfig {
    /// Root directory for local ledgers; each player gets a subdirectory.
    pub data_dir: PathBuf,
    pub player_id: PlayerId,
    /// Name of the remote snapshot holding this player's ledger.
    pub snapshot_name: String,
    /// Conflicts resolved per sync before giving up.
    pub max_conflict_attempts: u32,
    pub command_buffer: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            player_id: "local".to_string(),
            snapshot_name: "progress".to_string(),
            max_conflict_attempts: 10,
            command_buffer: 32,
        }
    }
}

impl ProgressConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `PROGRESS_DATA_DIR` - Root directory for ledgers (default: platform data dir)
    /// - `PROGRESS_PLAYER_ID` - Local player identifier (default: `local`)
    /// - `PROGRESS_SNAPSHOT_NAME` - Remote snapshot name (default: `progress`)
    /// - `SYNC_MAX_CONFLICT_ATTEMPTS` - Conflict retry ceiling (default: 10)
    /// - `PROGRESS_COMMAND_BUFFER` - Ledger worker queue size (default: 32)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("PROGRESS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(player) = env::var("PROGRESS_PLAYER_ID")
            && !player.trim().is_empty()
        {
            config.player_id = player;
        }

        if let Ok(name) = env::var("PROGRESS_SNAPSHOT_NAME")
            && !name.trim().is_empty()
        {
            config.snapshot_name = name;
        }

        if let Some(attempts) = read_env::<u32>("SYNC_MAX_CONFLICT_ATTEMPTS") {
            config.max_conflict_attempts = attempts.max(1);
        }

        if let Some(capacity) = read_env::<usize>("PROGRESS_COMMAND_BUFFER") {
            config.command_buffer = capacity.max(1);
        }

        config
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_player_id(mut self, player_id: impl Into<PlayerId>) -> Self {
        self.player_id = player_id.into();
        self
    }

    pub fn with_snapshot_name(mut self, name: impl Into<String>) -> Self {
        self.snapshot_name = name.into();
        self
    }

    pub fn with_max_conflict_attempts(mut self, attempts: u32) -> Self {
        self.max_conflict_attempts = attempts.max(1);
        self
    }

    /// Ledger directory of the configured player.
    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("players").join(&self.player_id)
    }
}

/// Platform data directory, falling back to `./data` when no home directory
/// can be determined.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = ProgressConfig::default()
            .with_data_dir("/tmp/progress")
            .with_player_id("alice")
            .with_max_conflict_attempts(0);

        assert_eq!(config.snapshot_name, "progress");
        assert_eq!(config.max_conflict_attempts, 1);
        assert_eq!(
            config.ledger_dir(),
            PathBuf::from("/tmp/progress/players/alice")
        );
    }
}
