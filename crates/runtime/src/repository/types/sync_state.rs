//! Per-player synchronization bookkeeping.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::counter::{CounterUpdate, PendingUpdate};
use crate::types::{GuessId, VersionToken};

/// Which guesses have been folded into reported counters.
///
/// `counted` is the only thing standing between a retry and a double count:
/// an id enters it at most once and is never removed. The aggregator extends
/// `counted` and enqueues its updates in `pending_report` in the same atomic
/// write, so the two can never disagree after a crash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Guess ids already folded into cumulative counters
    pub counted: BTreeSet<GuessId>,

    /// Version token of the last remote snapshot merged into the ledger
    pub last_applied_remote_version: Option<VersionToken>,

    /// Records with an id below this were part of a committed snapshot.
    /// Only those are aggregated.
    #[serde(default)]
    pub reconciled_below: GuessId,

    /// Best streak of consecutive days played reported so far
    #[serde(default)]
    pub best_played_streak: u32,

    /// Best streak of consecutive all-perfect days reported so far
    #[serde(default)]
    pub best_perfect_streak: u32,

    /// Updates computed but not yet acknowledged by the reporter
    #[serde(default)]
    pub pending_report: Vec<PendingUpdate>,

    /// Sequence number for the next outbox entry
    #[serde(default)]
    pub next_report_seq: u64,
}

impl SyncState {
    pub fn is_counted(&self, id: GuessId) -> bool {
        self.counted.contains(&id)
    }

    pub fn is_reconciled(&self, id: GuessId) -> bool {
        id < self.reconciled_below
    }

    /// Appends `updates` to the outbox with fresh sequence numbers.
    pub fn enqueue(&mut self, updates: impl IntoIterator<Item = CounterUpdate>) {
        for update in updates {
            self.pending_report.push(PendingUpdate {
                seq: self.next_report_seq,
                update,
            });
            self.next_report_seq += 1;
        }
    }

    /// Drops every outbox entry up to and including `through_seq`.
    ///
    /// Entries enqueued after the delivered batch was read are kept.
    pub fn acknowledge(&mut self, through_seq: u64) {
        self.pending_report.retain(|entry| entry.seq > through_seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::types::Counter;

    #[test]
    fn acknowledge_drops_delivered_sequence_only() {
        let mut state = SyncState::default();
        state.enqueue([
            CounterUpdate::new(Counter::Points, 3),
            CounterUpdate::new(Counter::WordsFound, 1),
        ]);
        let delivered = state.pending_report[0].seq;

        state.enqueue([CounterUpdate::new(Counter::Points, 2)]);
        state.acknowledge(delivered);

        let left: Vec<_> = state.pending_report.iter().map(|p| p.update).collect();
        assert_eq!(
            left,
            vec![
                CounterUpdate::new(Counter::WordsFound, 1),
                CounterUpdate::new(Counter::Points, 2),
            ]
        );
        assert_eq!(state.next_report_seq, 3);
    }

    #[test]
    fn acknowledging_twice_is_harmless() {
        let mut state = SyncState::default();
        state.enqueue([CounterUpdate::new(Counter::Points, 3)]);
        state.acknowledge(0);
        state.enqueue([CounterUpdate::new(Counter::Points, 4)]);
        state.acknowledge(0);

        assert_eq!(state.pending_report.len(), 1);
        assert_eq!(state.pending_report[0].seq, 1);
    }
}
