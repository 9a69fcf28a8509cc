//! Guess records.

use serde::{Deserialize, Serialize};

use puzzle_core::Fingerprint;

use crate::types::{GuessId, TimestampMs};

/// The portable content of one player submission.
///
/// This tuple is what crosses devices: snapshots store it, and merging
/// treats ledgers as sets of it. Field order defines the canonical sort
/// order of a merged ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Guess {
    /// When the guess was submitted (epoch millis)
    pub timestamp: TimestampMs,

    /// Fingerprint of the puzzle the guess was made against
    pub puzzle: Fingerprint,

    /// Raw player text
    pub word: String,

    /// Verdict at insertion time
    pub is_correct: bool,
}

impl Guess {
    pub fn new(
        timestamp: TimestampMs,
        puzzle: Fingerprint,
        word: impl Into<String>,
        is_correct: bool,
    ) -> Self {
        Self {
            timestamp,
            puzzle,
            word: word.into(),
            is_correct,
        }
    }

    /// Lowercase form used for duplicate detection.
    pub fn normalized_word(&self) -> String {
        self.word.trim().to_lowercase()
    }
}

/// A guess as stored in the local ledger.
///
/// Records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub id: GuessId,
    pub guess: Guess,
}

impl GuessRecord {
    pub fn new(id: GuessId, guess: Guess) -> Self {
        Self { id, guess }
    }

    pub fn puzzle(&self) -> &Fingerprint {
        &self.guess.puzzle
    }

    pub fn is_correct(&self) -> bool {
        self.guess.is_correct
    }
}
