//! Recompute progress statistics from a ledger and a puzzle history file
//!
//! The history file is a JSON array of entries:
//!
//! ```json
//! [{"played_on":"2024-01-01","puzzle":"<fingerprint>","perfect_word_count":1,"letters":["a","b","c","d","e","f"]}]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use progress_runtime::types::GuessId;
use progress_runtime::{PuzzleHistoryEntry, SyncState, aggregate};

use crate::{dirs, utils};

/// Recompute totals, streaks and pending work for a ledger
#[derive(Parser)]
pub struct Stats {
    /// Puzzle history JSON file
    #[arg(value_name = "HISTORY")]
    history: PathBuf,

    /// Player whose ledger to read (defaults to PROGRESS_PLAYER_ID or `local`)
    #[arg(short, long, value_name = "PLAYER")]
    player: Option<String>,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

impl Stats {
    pub fn execute(self) -> Result<()> {
        let ledger_dir = dirs::ledger_dir(self.data_dir, self.player);
        let (manifest, records) = utils::load_ledger(&ledger_dir)?;

        let raw = std::fs::read(&self.history)
            .with_context(|| format!("Failed to read history: {}", self.history.display()))?;
        let history: Vec<PuzzleHistoryEntry> = serde_json::from_slice(&raw)
            .with_context(|| format!("Invalid history file: {}", self.history.display()))?;

        // From scratch, as if every record had been synced: everything the
        // ledger is worth.
        let everything = SyncState {
            reconciled_below: GuessId::MAX,
            ..SyncState::default()
        };
        let totals = aggregate(&records, &history, &everything).report;
        // Against the stored state: what the next sync would still report.
        let pending = aggregate(&records, &history, &manifest.sync_state).report;

        println!("{} {}", style("Ledger:").bold().cyan(), ledger_dir.display());
        println!(
            "{} {} records, {} puzzles in history",
            style("Input:").bold().cyan(),
            records.len(),
            history.len()
        );
        println!();

        println!("{}", style("Totals").bold().underlined());
        println!("  points:          {}", style(totals.points_delta).green());
        println!("  words found:     {}", totals.words_found_delta);
        println!("  perfect words:   {}", totals.perfect_words_delta);
        println!("  played streak:   {}", totals.longest_played_streak);
        println!("  perfect streak:  {}", totals.longest_perfect_streak);
        if totals.deferred > 0 {
            println!(
                "  {} {} records reference puzzles missing from history",
                style("!").yellow().bold(),
                totals.deferred
            );
        }

        println!();
        println!("{}", style("Not yet reported").bold().underlined());
        if pending.is_empty() && manifest.sync_state.pending_report.is_empty() {
            println!("  {}", style("nothing").dim());
        } else {
            let queued = manifest.sync_state.pending_report.iter().map(|entry| &entry.update);
            for update in queued.chain(&pending.updates) {
                println!("  {}", utils::format_update(update));
            }
        }
        if pending.unsynced > 0 {
            println!(
                "  {} {} records wait for their first sync",
                style("!").yellow().bold(),
                pending.unsynced
            );
        }

        Ok(())
    }
}
