//! Read and inspect a player's local progress ledger
//!
//! Loads the manifest and the live generation log read-only and displays
//! records and sync bookkeeping.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use progress_runtime::GuessRecord;

use crate::{dirs, utils};

/// Read and inspect a local progress ledger
#[derive(Parser)]
pub struct ReadLedger {
    /// Player whose ledger to read (defaults to PROGRESS_PLAYER_ID or `local`)
    #[arg(short, long, value_name = "PLAYER")]
    player: Option<String>,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Only show records whose puzzle fingerprint starts with this prefix
    #[arg(long, value_name = "PREFIX")]
    puzzle: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// Limit number of records to display (0 = unlimited)
    #[arg(short, long, default_value = "100")]
    limit: usize,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Per-puzzle counts and sync state
    Summary,
    /// One line per record
    List,
    /// Full JSON output
    Json,
}

impl ReadLedger {
    pub fn execute(self) -> Result<()> {
        let ledger_dir = dirs::ledger_dir(self.data_dir, self.player);
        let (manifest, records) = utils::load_ledger(&ledger_dir)?;

        let records: Vec<GuessRecord> = match &self.puzzle {
            Some(prefix) => records
                .into_iter()
                .filter(|r| r.puzzle().as_str().starts_with(prefix.as_str()))
                .collect(),
            None => records,
        };
        let shown = if self.limit == 0 {
            records.len()
        } else {
            self.limit.min(records.len())
        };

        if let OutputFormat::Json = self.format {
            let output = serde_json::json!({
                "generation": manifest.generation,
                "next_id": manifest.next_id,
                "sync_state": manifest.sync_state,
                "records": &records[..shown],
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{} {}", style("Ledger:").bold().cyan(), ledger_dir.display());
        println!(
            "{} {}  {} {}",
            style("Generation:").bold().cyan(),
            manifest.generation,
            style("Next id:").bold().cyan(),
            manifest.next_id
        );
        println!(
            "{} {}",
            style("Total Records:").bold().cyan(),
            records.len()
        );
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&records),
            OutputFormat::List => print_list(&records[..shown]),
            OutputFormat::Json => {}
        }

        let state = &manifest.sync_state;
        println!();
        println!("{}", style("Sync state").bold().underlined());
        println!(
            "  counted: {}/{}",
            records.iter().filter(|r| state.is_counted(r.id)).count(),
            records.len()
        );
        println!(
            "  last remote version: {}",
            state.last_applied_remote_version.as_deref().unwrap_or("-")
        );
        println!("  reconciled below id: {}", state.reconciled_below);
        println!(
            "  best streaks: played {}, perfect {}",
            state.best_played_streak, state.best_perfect_streak
        );
        if !state.pending_report.is_empty() {
            println!(
                "  {} {} undelivered counter updates",
                style("!").yellow().bold(),
                state.pending_report.len()
            );
            for entry in &state.pending_report {
                println!(
                    "    #{:<4} {}",
                    entry.seq,
                    utils::format_update(&entry.update)
                );
            }
        }

        if shown < records.len() && matches!(self.format, OutputFormat::List) {
            println!();
            println!(
                "{}",
                style(format!("... {} more (use --limit 0)", records.len() - shown)).dim()
            );
        }

        Ok(())
    }
}

fn print_summary(records: &[GuessRecord]) {
    let mut per_puzzle: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = per_puzzle.entry(record.puzzle().short()).or_default();
        entry.0 += 1;
        if record.is_correct() {
            entry.1 += 1;
        }
    }

    println!("{}", style("Puzzles").bold().underlined());
    for (puzzle, (total, correct)) in per_puzzle {
        println!(
            "  {}  {} guesses, {} correct",
            style(puzzle).cyan(),
            total,
            style(correct).green()
        );
    }
}

fn print_list(records: &[GuessRecord]) {
    for record in records {
        let mark = if record.is_correct() {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "  [{:>5}] {} {:<16} {}  {}",
            record.id,
            mark,
            record.guess.word,
            style(record.puzzle().short()).dim(),
            style(record.guess.timestamp).dim()
        );
    }
}
