//! In-memory ProgressLedger implementation for tests and local runs.

use puzzle_core::Fingerprint;

use crate::repository::union::union_records;
use crate::repository::{
    Guess, GuessRecord, ProgressLedger, Result, StorageError, SyncState,
};
use crate::types::GuessId;

/// In-memory implementation of ProgressLedger.
///
/// Can be switched to "unavailable" to exercise storage failure paths.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: Vec<GuessRecord>,
    state: SyncState,
    next_id: GuessId,
    unavailable: bool,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing store going away (or coming back).
    pub fn set_available(&mut self, available: bool) {
        self.unavailable = !available;
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(StorageError::Unavailable("in-memory ledger offline".into()));
        }
        Ok(())
    }
}

impl ProgressLedger for InMemoryLedger {
    fn append(&mut self, guess: Guess) -> Result<GuessId> {
        self.ensure_available()?;
        let id = self.next_id;
        self.records.push(GuessRecord::new(id, guess));
        self.next_id += 1;
        Ok(id)
    }

    fn query_by_puzzle(&self, puzzle: &Fingerprint) -> Result<Vec<GuessRecord>> {
        self.ensure_available()?;
        Ok(self
            .records
            .iter()
            .filter(|record| record.puzzle() == puzzle)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<GuessRecord>> {
        self.ensure_available()?;
        Ok(self.records.clone())
    }

    fn sync_state(&self) -> Result<SyncState> {
        self.ensure_available()?;
        Ok(self.state.clone())
    }

    fn replace_all(
        &mut self,
        guesses: Vec<Guess>,
        mut state: SyncState,
    ) -> Result<Vec<GuessRecord>> {
        self.ensure_available()?;
        let mut next_id = self.next_id;
        let records = union_records(&self.records, guesses, &mut next_id, &mut state);

        self.records = records.clone();
        self.state = state;
        self.next_id = next_id;
        Ok(records)
    }

    fn commit_sync_state(&mut self, state: &SyncState) -> Result<()> {
        self.ensure_available()?;
        self.state = state.clone();
        Ok(())
    }
}
