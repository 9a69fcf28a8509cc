//! Development tasks for the word-puzzle progress workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;
mod utils;

use anyhow::Result;
use clap::Parser;
use commands::{Clean, DecodeSnapshot, ReadLedger, Stats};

/// Development tasks for the word-puzzle progress workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for puzzle progress ledgers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Read and inspect a local progress ledger
    ReadLedger(ReadLedger),

    /// Recompute statistics from a ledger and puzzle history
    Stats(Stats),

    /// Decode and inspect a snapshot blob
    DecodeSnapshot(DecodeSnapshot),

    /// Clean local progress data
    Clean(Clean),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for PROGRESS_DATA_DIR and other env vars)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::ReadLedger(cmd) => cmd.execute(),
        Command::Stats(cmd) => cmd.execute(),
        Command::DecodeSnapshot(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
    }
}
