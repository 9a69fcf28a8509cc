//! Cloneable façade for issuing commands to the ledger worker.
//!
//! [`ProgressHandle`] hides channel plumbing. Clones share one worker, so
//! every operation issued through any clone is serialized against the others.
//! Clones also share one sync lock, so at most one sync or resume runs
//! against the ledger at a time.
use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, mpsc, oneshot};

use puzzle_core::{Fingerprint, PuzzleDefinition};

use super::errors::{ProgressError, Result};
use crate::aggregate::AggregationReport;
use crate::repository::{Guess, GuessRecord, PuzzleHistoryEntry, SyncState};
use crate::types::{GuessId, TimestampMs, VersionToken, current_timestamp_ms};
use crate::workers::{Command, Submission};

/// Client-facing handle to a player's progress ledger
#[derive(Clone)]
pub struct ProgressHandle {
    command_tx: mpsc::Sender<Command>,
    sync_lock: Arc<Mutex<()>>,
}

impl ProgressHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self {
            command_tx,
            sync_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Waits until no other sync or resume holds the ledger.
    pub(crate) async fn lock_sync(&self) -> MutexGuard<'_, ()> {
        self.sync_lock.lock().await
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ProgressError::CommandChannelClosed)?;

        reply_rx.await.map_err(ProgressError::ReplyChannelClosed)
    }

    /// Validate `word` against `puzzle` and record the attempt, correct or
    /// not. Duplicates are checked against the words already in the ledger.
    pub async fn submit_guess(
        &self,
        puzzle: &PuzzleDefinition,
        word: impl Into<String>,
    ) -> Result<Submission> {
        self.submit_guess_at(puzzle, word, current_timestamp_ms())
            .await
    }

    pub async fn submit_guess_at(
        &self,
        puzzle: &PuzzleDefinition,
        word: impl Into<String>,
        timestamp: TimestampMs,
    ) -> Result<Submission> {
        let puzzle = Box::new(puzzle.clone());
        let word = word.into();
        self.request(|reply| Command::SubmitGuess {
            puzzle,
            word,
            timestamp,
            reply,
        })
        .await?
    }

    /// Record an already-judged guess.
    pub async fn append(&self, guess: Guess) -> Result<GuessId> {
        self.request(|reply| Command::Append { guess, reply })
            .await?
    }

    /// All records for `puzzle`, in insertion order.
    pub async fn query_by_puzzle(&self, puzzle: &Fingerprint) -> Result<Vec<GuessRecord>> {
        let puzzle = puzzle.clone();
        self.request(|reply| Command::QueryByPuzzle { puzzle, reply })
            .await?
    }

    /// Lowercase words already found for `puzzle`.
    pub async fn found_words(&self, puzzle: &Fingerprint) -> Result<BTreeSet<String>> {
        let puzzle = puzzle.clone();
        self.request(|reply| Command::FoundWords { puzzle, reply })
            .await?
    }

    pub async fn export(&self) -> Result<Vec<GuessRecord>> {
        self.request(|reply| Command::Export { reply }).await?
    }

    pub async fn sync_state(&self) -> Result<SyncState> {
        self.request(|reply| Command::SyncState { reply }).await?
    }

    /// Persist a reconciled ledger, recording `version` as the last applied
    /// remote version. Local records missing from `guesses` are kept.
    pub async fn apply_reconciliation(
        &self,
        guesses: Vec<Guess>,
        version: VersionToken,
    ) -> Result<Vec<GuessRecord>> {
        self.request(|reply| Command::ApplyReconciliation {
            guesses,
            version,
            reply,
        })
        .await?
    }

    /// Fold every uncounted, reconciled record into counter updates. The
    /// updates are queued in the report outbox in the same write that marks
    /// records counted.
    pub async fn aggregate(&self, history: Vec<PuzzleHistoryEntry>) -> Result<AggregationReport> {
        self.request(|reply| Command::Aggregate { history, reply })
            .await?
    }

    /// Remove outbox entries up to and including `through_seq` after they
    /// were delivered.
    pub async fn acknowledge_report(&self, through_seq: u64) -> Result<()> {
        self.request(|reply| Command::AcknowledgeReport { through_seq, reply })
            .await?
    }
}
