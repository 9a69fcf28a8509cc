//! Ledger worker that owns the player's [`ProgressLedger`].
//!
//! Every read-modify-write of the ledger goes through this task's command
//! queue, so guess submission and sync reconciliation never interleave.
//! Commands from one sender are processed in FIFO order.

use std::collections::BTreeSet;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use puzzle_core::{Fingerprint, PuzzleDefinition, Verdict, validate};

use crate::aggregate::{AggregationReport, aggregate};
use crate::api::Result;
use crate::repository::{Guess, GuessRecord, ProgressLedger, PuzzleHistoryEntry, SyncState};
use crate::types::{GuessId, TimestampMs, VersionToken};

/// Result of submitting a word for a puzzle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub id: GuessId,
    pub verdict: Verdict,
    /// Points earned by this word; zero unless the verdict is `Correct`.
    pub points: u32,
}

/// Commands that can be sent to the ledger worker
pub enum Command {
    /// Validate a word against the puzzle and record the attempt.
    SubmitGuess {
        puzzle: Box<PuzzleDefinition>,
        word: String,
        timestamp: TimestampMs,
        reply: oneshot::Sender<Result<Submission>>,
    },
    /// Record an already-judged guess.
    Append {
        guess: Guess,
        reply: oneshot::Sender<Result<GuessId>>,
    },
    QueryByPuzzle {
        puzzle: Fingerprint,
        reply: oneshot::Sender<Result<Vec<GuessRecord>>>,
    },
    FoundWords {
        puzzle: Fingerprint,
        reply: oneshot::Sender<Result<BTreeSet<String>>>,
    },
    /// Every record, for sync export.
    Export {
        reply: oneshot::Sender<Result<Vec<GuessRecord>>>,
    },
    SyncState {
        reply: oneshot::Sender<Result<SyncState>>,
    },
    /// Persist a reconciled ledger and the remote version it was committed as.
    ApplyReconciliation {
        guesses: Vec<Guess>,
        version: VersionToken,
        reply: oneshot::Sender<Result<Vec<GuessRecord>>>,
    },
    /// Fold uncounted records into counters and persist the new state.
    Aggregate {
        history: Vec<PuzzleHistoryEntry>,
        reply: oneshot::Sender<Result<AggregationReport>>,
    },
    /// Drop outbox entries up to and including `through_seq`.
    AcknowledgeReport {
        through_seq: u64,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Background task that serializes all access to one ledger.
pub struct LedgerWorker {
    ledger: Box<dyn ProgressLedger>,
    command_rx: mpsc::Receiver<Command>,
}

impl LedgerWorker {
    pub fn new(ledger: Box<dyn ProgressLedger>, command_rx: mpsc::Receiver<Command>) -> Self {
        Self { ledger, command_rx }
    }

    /// Main worker loop. Ends once every handle is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }
        debug!("Ledger worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SubmitGuess {
                puzzle,
                word,
                timestamp,
                reply,
            } => {
                let result = self.submit_guess(&puzzle, word, timestamp);
                if reply.send(result).is_err() {
                    debug!("SubmitGuess reply channel closed (caller dropped)");
                }
            }
            Command::Append { guess, reply } => {
                let result = self.ledger.append(guess).map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("Append reply channel closed (caller dropped)");
                }
            }
            Command::QueryByPuzzle { puzzle, reply } => {
                let result = self.ledger.query_by_puzzle(&puzzle).map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("QueryByPuzzle reply channel closed (caller dropped)");
                }
            }
            Command::FoundWords { puzzle, reply } => {
                let result = self.ledger.found_words(&puzzle).map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("FoundWords reply channel closed (caller dropped)");
                }
            }
            Command::Export { reply } => {
                let result = self.ledger.all().map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("Export reply channel closed (caller dropped)");
                }
            }
            Command::SyncState { reply } => {
                let result = self.ledger.sync_state().map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("SyncState reply channel closed (caller dropped)");
                }
            }
            Command::ApplyReconciliation {
                guesses,
                version,
                reply,
            } => {
                let result = self.apply_reconciliation(guesses, version);
                if reply.send(result).is_err() {
                    debug!("ApplyReconciliation reply channel closed (caller dropped)");
                }
            }
            Command::Aggregate { history, reply } => {
                let result = self.aggregate(&history);
                if reply.send(result).is_err() {
                    debug!("Aggregate reply channel closed (caller dropped)");
                }
            }
            Command::AcknowledgeReport { through_seq, reply } => {
                let result = self.acknowledge_report(through_seq);
                if reply.send(result).is_err() {
                    debug!("AcknowledgeReport reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn submit_guess(
        &mut self,
        puzzle: &PuzzleDefinition,
        word: String,
        timestamp: TimestampMs,
    ) -> Result<Submission> {
        let found = self.ledger.found_words(puzzle.fingerprint())?;
        let verdict = validate(puzzle, &word, &found);
        let points = if verdict.is_correct() {
            puzzle.score(word.trim())
        } else {
            0
        };

        let guess = Guess::new(
            timestamp,
            puzzle.fingerprint().clone(),
            word,
            verdict.is_correct(),
        );
        let id = self.ledger.append(guess)?;

        debug!(
            "Guess[{}] for puzzle {}: {} ({} points)",
            id,
            puzzle.fingerprint().short(),
            verdict,
            points
        );

        Ok(Submission { id, verdict, points })
    }

    fn apply_reconciliation(
        &mut self,
        guesses: Vec<Guess>,
        version: VersionToken,
    ) -> Result<Vec<GuessRecord>> {
        let mut state = self.ledger.sync_state()?;
        state.last_applied_remote_version = Some(version);
        Ok(self.ledger.replace_all(guesses, state)?)
    }

    fn aggregate(&mut self, history: &[PuzzleHistoryEntry]) -> Result<AggregationReport> {
        let records = self.ledger.all()?;
        let state = self.ledger.sync_state()?;

        let aggregation = aggregate(&records, history, &state);
        if aggregation.state != state {
            self.ledger.commit_sync_state(&aggregation.state)?;
        }

        Ok(aggregation.report)
    }

    fn acknowledge_report(&mut self, through_seq: u64) -> Result<()> {
        let mut state = self.ledger.sync_state()?;
        if !state
            .pending_report
            .iter()
            .any(|entry| entry.seq <= through_seq)
        {
            return Ok(());
        }
        state.acknowledge(through_seq);
        self.ledger.commit_sync_state(&state)?;
        Ok(())
    }
}
