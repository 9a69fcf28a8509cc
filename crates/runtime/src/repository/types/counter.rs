//! Externally reported counters.

use serde::{Deserialize, Serialize};

/// Counters handed to leaderboard/achievement reporters.
///
/// The reporter owns the mapping from these ids to platform achievement or
/// leaderboard identifiers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Counter {
    /// Points from correct words
    Points,
    /// Correct words found
    WordsFound,
    /// Perfect words found
    PerfectWords,
    /// Longest run of consecutive days played
    PlayedStreak,
    /// Longest run of consecutive days with every perfect word found
    PerfectStreak,
}

/// How a reporter folds an update into its stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Add the update to the stored total.
    Increment,
    /// Raise the stored value to the update if it is lower.
    ///
    /// Receiving the same value from several devices is harmless.
    Maximum,
}

impl Counter {
    pub fn kind(self) -> CounterKind {
        match self {
            Counter::Points | Counter::WordsFound | Counter::PerfectWords => CounterKind::Increment,
            Counter::PlayedStreak | Counter::PerfectStreak => CounterKind::Maximum,
        }
    }
}

/// A non-negative update of one counter, interpreted per [`Counter::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterUpdate {
    pub counter: Counter,
    pub value: u64,
}

impl CounterUpdate {
    pub fn new(counter: Counter, value: u64) -> Self {
        Self { counter, value }
    }
}

/// An outbox entry awaiting delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    /// Position in the outbox; strictly increasing per ledger
    pub seq: u64,
    pub update: CounterUpdate,
}
