//! Decode a remote snapshot blob
//!
//! Accepts every shape the sync layer reads and reports decode failures
//! exactly as a sync would see them.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use progress_runtime::SnapshotCodec;

/// Decode and inspect a snapshot blob file
#[derive(Parser)]
pub struct DecodeSnapshot {
    /// Snapshot blob file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print every guess instead of a summary
    #[arg(long)]
    list: bool,

    /// Re-encode in the current format and write to this path
    #[arg(long, value_name = "OUT")]
    upgrade: Option<PathBuf>,
}

impl DecodeSnapshot {
    pub fn execute(self) -> Result<()> {
        let bytes = std::fs::read(&self.file)
            .with_context(|| format!("Failed to read snapshot: {}", self.file.display()))?;

        let guesses = match SnapshotCodec::decode(&bytes) {
            Ok(guesses) => guesses,
            Err(error) => {
                eprintln!(
                    "{} {} ({} bytes)",
                    style("✗ Undecodable snapshot:").red().bold(),
                    error,
                    bytes.len()
                );
                eprintln!(
                    "{}",
                    style("A sync treats this snapshot as empty and overwrites it.").dim()
                );
                anyhow::bail!("snapshot decode failed");
            }
        };

        let puzzles: BTreeSet<_> = guesses.iter().map(|g| g.puzzle.clone()).collect();
        let correct = guesses.iter().filter(|g| g.is_correct).count();

        println!("{} {}", style("Snapshot:").bold().cyan(), self.file.display());
        println!(
            "{} {} guesses ({} correct) across {} puzzles",
            style("Contents:").bold().cyan(),
            guesses.len(),
            correct,
            puzzles.len()
        );

        if self.list {
            println!();
            for guess in &guesses {
                let mark = if guess.is_correct {
                    style("✓").green()
                } else {
                    style("✗").red()
                };
                println!(
                    "  {} {:<16} {}  {}",
                    mark,
                    guess.word,
                    style(guess.puzzle.short()).dim(),
                    style(guess.timestamp).dim()
                );
            }
        }

        if let Some(out) = self.upgrade {
            let encoded = SnapshotCodec::encode(&guesses)?;
            std::fs::write(&out, encoded)
                .with_context(|| format!("Failed to write: {}", out.display()))?;
            println!();
            println!(
                "{} {}",
                style("✓ Re-encoded to").green().bold(),
                out.display()
            );
        }

        Ok(())
    }
}
