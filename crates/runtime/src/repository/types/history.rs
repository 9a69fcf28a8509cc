//! Puzzle history supplied by the puzzle fetcher.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use puzzle_core::{Fingerprint, LetterSet, PuzzleDefinition};

/// One day's puzzle, as far as aggregation needs to know it.
///
/// Puzzles are not kept verbatim in the ledger; the fingerprint joins guesses
/// to the day they were played and `letters` lets the aggregator re-apply the
/// perfect-word rule to historical guesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleHistoryEntry {
    /// Calendar day (local time) the puzzle was published for
    pub played_on: NaiveDate,

    pub puzzle: Fingerprint,

    /// Number of perfect words in that day's puzzle
    pub perfect_word_count: u32,

    /// The puzzle's outer letters
    pub letters: LetterSet,
}

impl PuzzleHistoryEntry {
    pub fn from_definition(played_on: NaiveDate, def: &PuzzleDefinition) -> Self {
        Self {
            played_on,
            puzzle: def.fingerprint().clone(),
            perfect_word_count: u32::try_from(def.perfect_word_count()).unwrap_or(u32::MAX),
            letters: def.letter_set().clone(),
        }
    }
}
