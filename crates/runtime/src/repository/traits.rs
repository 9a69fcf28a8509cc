//! Ledger contract for the local guess log and its sync bookkeeping.

use std::collections::BTreeSet;

use puzzle_core::Fingerprint;

use super::error::Result;
use super::types::{Guess, GuessRecord, SyncState};
use crate::types::GuessId;

/// Durable, append-only store of a player's guesses plus their [`SyncState`].
///
/// A ledger has exactly one writer: the ledger worker owns it and serializes
/// guess submission against reconciliation. Every mutating call either takes
/// full effect or leaves the ledger unchanged.
pub trait ProgressLedger: Send {
    /// Append a guess and return its newly assigned id.
    ///
    /// Ids increase monotonically and are never reused.
    fn append(&mut self, guess: Guess) -> Result<GuessId>;

    /// All records for a puzzle, correct and incorrect, in insertion order.
    fn query_by_puzzle(&self, puzzle: &Fingerprint) -> Result<Vec<GuessRecord>>;

    /// Every record in insertion order.
    fn all(&self) -> Result<Vec<GuessRecord>>;

    /// Current sync bookkeeping.
    fn sync_state(&self) -> Result<SyncState>;

    /// Atomically install the result of a reconciliation.
    ///
    /// The stored set becomes the union of the current records and
    /// `guesses`: records already present keep their ids, unseen guesses get
    /// fresh ids, and nothing is removed. Unseen guesses were recorded and
    /// counted on another device, so their ids join `state.counted`.
    /// `state.reconciled_below` moves past every record that is part of
    /// `guesses`, stopping at the first one appended since they were exported.
    /// `state` replaces
    /// the stored sync state in the same step. Returns the full record list
    /// afterwards.
    fn replace_all(&mut self, guesses: Vec<Guess>, state: SyncState) -> Result<Vec<GuessRecord>>;

    /// Atomically replace the stored sync state (aggregation commit).
    fn commit_sync_state(&mut self, state: &SyncState) -> Result<()>;

    /// Lowercase words already found for a puzzle.
    fn found_words(&self, puzzle: &Fingerprint) -> Result<BTreeSet<String>> {
        Ok(self
            .query_by_puzzle(puzzle)?
            .into_iter()
            .filter(GuessRecord::is_correct)
            .map(|record| record.guess.normalized_word())
            .collect())
    }
}
