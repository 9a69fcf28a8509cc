//! Clean local progress data command
//!
//! Deletes either one player's ledger or the whole data directory.
//!
//! Safety: Always prompts for confirmation before deletion.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use crate::dirs;

/// Clean local progress data
#[derive(Parser, Debug)]
pub struct Clean {
    /// Only delete this player's ledger
    #[arg(short, long, value_name = "PLAYER")]
    pub player: Option<String>,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Skip confirmation prompt (dangerous!)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        let (label, target) = match self.player {
            Some(player) => (
                format!("Ledger of {}", player),
                dirs::ledger_dir(self.data_dir, Some(player)),
            ),
            None => ("All progress data".to_string(), dirs::data_dir(self.data_dir)),
        };

        if !target.exists() {
            println!(
                "{}",
                style("Nothing to clean - directory doesn't exist yet").dim()
            );
            return Ok(());
        }

        println!("{}", style("Clean progress data").yellow().bold());
        println!();
        println!("The following will be deleted:");
        println!("  {} {}", style("→").cyan(), style(&label).bold());
        println!("    {}", style(target.display()).dim());
        println!();

        if !self.yes && !confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        print!("Deleting {}... ", label);
        io::stdout().flush()?;

        std::fs::remove_dir_all(&target)
            .with_context(|| format!("Failed to delete: {}", target.display()))?;

        println!("{}", style("✓").green());
        Ok(())
    }
}

/// Prompt user for confirmation
fn confirm() -> Result<bool> {
    print!("{} ", style("Proceed? [y/N]").yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
