//! Exactly-once folding of the reconciled ledger into reportable counters.
//!
//! [`aggregate`] is pure: it takes the ledger, the puzzle history and the
//! current [`SyncState`] and returns the report together with the next state.
//! The caller persists that state (which carries the report in its outbox)
//! in one write, so counters and `counted` can never drift apart.
//!
//! Only records that were part of a committed snapshot are aggregated, so a
//! device has always seen every other device's copy of a word before it
//! scores its own. Point and word deltas only cover records not yet in
//! `counted`. Streaks are recomputed over the whole reconciled ledger and
//! reported as absolute values whenever they beat the best reported so far;
//! reporters keep the maximum, so two devices reporting the same streak
//! cannot inflate it.

mod streak;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;

use puzzle_core::{Fingerprint, score_word};

use crate::repository::{Counter, CounterUpdate, GuessRecord, PuzzleHistoryEntry, SyncState};

pub use streak::longest_run;

/// Updates produced by one aggregation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub points_delta: u64,
    pub words_found_delta: u64,
    pub perfect_words_delta: u64,
    /// Longest run of played days over the reconciled ledger.
    pub longest_played_streak: u32,
    /// Longest run of days on which every perfect word was found.
    pub longest_perfect_streak: u32,
    /// Updates to report, in reporting order. Zero deltas and streaks that
    /// do not beat the reported best are left out.
    pub updates: Vec<CounterUpdate>,
    /// Records newly moved into `counted`.
    pub processed: usize,
    /// Records left uncounted because their puzzle is not in the history.
    pub deferred: usize,
    /// Records left uncounted because they were never part of a committed
    /// snapshot. The next sync picks them up.
    pub unsynced: usize,
}

impl AggregationReport {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    pub report: AggregationReport,
    /// State to persist: `counted` extended, best streaks raised and the
    /// report's updates queued in `pending_report`.
    pub state: SyncState,
}

/// Fold every uncounted, reconciled record in `records` into counter updates.
pub fn aggregate(
    records: &[GuessRecord],
    history: &[PuzzleHistoryEntry],
    state: &SyncState,
) -> Aggregation {
    let puzzles: HashMap<&Fingerprint, &PuzzleHistoryEntry> =
        history.iter().map(|entry| (&entry.puzzle, entry)).collect();

    // Counted records first: their words must be known before any new
    // record is scored, whatever the ids.
    let mut ordered: Vec<&GuessRecord> = records.iter().collect();
    ordered.sort_by_key(|record| (!state.is_counted(record.id), record.id));

    let mut report = AggregationReport::default();
    let mut next = state.clone();

    // Correct words already scored, so a word found on two devices is only
    // worth points once.
    let mut scored: HashSet<(&Fingerprint, String)> = HashSet::new();
    let mut perfect_found: HashMap<&Fingerprint, BTreeSet<String>> = HashMap::new();
    let mut played: BTreeSet<NaiveDate> = BTreeSet::new();

    for record in ordered {
        if !state.is_counted(record.id) && !state.is_reconciled(record.id) {
            report.unsynced += 1;
            continue;
        }

        let Some(entry) = puzzles.get(record.puzzle()) else {
            if !state.is_counted(record.id) {
                report.deferred += 1;
            }
            continue;
        };

        let word = record.guess.normalized_word();
        let perfect = record.is_correct() && entry.letters.is_perfect(&word);

        if record.is_correct() {
            played.insert(entry.played_on);
            if perfect {
                perfect_found
                    .entry(record.puzzle())
                    .or_default()
                    .insert(word.clone());
            }
        }

        if state.is_counted(record.id) {
            if record.is_correct() {
                scored.insert((record.puzzle(), word));
            }
            continue;
        }

        next.counted.insert(record.id);
        report.processed += 1;

        if record.is_correct() && scored.insert((record.puzzle(), word.clone())) {
            report.points_delta += u64::from(score_word(&word, perfect));
            report.words_found_delta += 1;
            if perfect {
                report.perfect_words_delta += 1;
            }
            tracing::debug!(
                "Counted guess[{}] {:?} for puzzle {}",
                record.id,
                word,
                record.puzzle().short()
            );
        }
    }

    let perfect_days = perfect_days(history, &perfect_found);

    report.longest_played_streak = longest_run(played);
    report.longest_perfect_streak = longest_run(perfect_days);

    // Streaks go out as absolute values, and only when they beat the best.
    let new_best = |longest: u32, best: u32| {
        if longest > best {
            u64::from(longest)
        } else {
            0
        }
    };
    let played_best = new_best(report.longest_played_streak, state.best_played_streak);
    let perfect_best = new_best(report.longest_perfect_streak, state.best_perfect_streak);
    next.best_played_streak = state.best_played_streak.max(report.longest_played_streak);
    next.best_perfect_streak = state.best_perfect_streak.max(report.longest_perfect_streak);

    report.updates = [
        (Counter::Points, report.points_delta),
        (Counter::WordsFound, report.words_found_delta),
        (Counter::PerfectWords, report.perfect_words_delta),
        (Counter::PlayedStreak, played_best),
        (Counter::PerfectStreak, perfect_best),
    ]
    .into_iter()
    .filter(|(_, value)| *value > 0)
    .map(|(counter, value)| CounterUpdate::new(counter, value))
    .collect();

    next.enqueue(report.updates.iter().copied());

    if report.deferred > 0 {
        tracing::warn!(
            "{} guesses reference puzzles missing from history; left uncounted",
            report.deferred
        );
    }

    Aggregation {
        report,
        state: next,
    }
}

/// Days on which every perfect word of some puzzle played that day was found.
/// Puzzles without perfect words never make a perfect day.
fn perfect_days(
    history: &[PuzzleHistoryEntry],
    perfect_found: &HashMap<&Fingerprint, BTreeSet<String>>,
) -> BTreeSet<NaiveDate> {
    let mut by_day: BTreeMap<NaiveDate, bool> = BTreeMap::new();

    for entry in history {
        let found = perfect_found
            .get(&entry.puzzle)
            .map_or(0, |words| words.len());
        let complete =
            entry.perfect_word_count > 0 && found as u64 == u64::from(entry.perfect_word_count);
        *by_day.entry(entry.played_on).or_default() |= complete;
    }

    by_day
        .into_iter()
        .filter_map(|(day, complete)| complete.then_some(day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Guess;
    use puzzle_core::LetterSet;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn entry(d: u32, fp: &str, perfect_words: u32) -> PuzzleHistoryEntry {
        PuzzleHistoryEntry {
            played_on: day(d),
            puzzle: Fingerprint::new(fp),
            perfect_word_count: perfect_words,
            letters: LetterSet::new("abcdef".chars()),
        }
    }

    fn record(id: u64, fp: &str, word: &str, correct: bool) -> GuessRecord {
        GuessRecord::new(id, Guess::new(id as i64, Fingerprint::new(fp), word, correct))
    }

    /// State after a sync that covered ids below `below`.
    fn synced_below(below: u64) -> SyncState {
        SyncState {
            reconciled_below: below,
            ..Default::default()
        }
    }

    fn queued(state: &SyncState) -> Vec<CounterUpdate> {
        state.pending_report.iter().map(|entry| entry.update).collect()
    }

    #[test]
    fn counts_new_correct_records() {
        let history = [entry(1, "p1", 1)];
        let records = [
            record(0, "p1", "cage", true),
            record(1, "p1", "zzz", false),
            record(2, "p1", "fabcedg", true),
        ];

        let result = aggregate(&records, &history, &synced_below(3));
        let report = &result.report;

        // cage = 2, fabcedg = 7 + 10
        assert_eq!(report.points_delta, 19);
        assert_eq!(report.words_found_delta, 2);
        assert_eq!(report.perfect_words_delta, 1);
        assert_eq!(report.processed, 3);
        assert_eq!(report.longest_played_streak, 1);
        assert_eq!(report.longest_perfect_streak, 1);
        assert_eq!(result.state.counted, BTreeSet::from([0, 1, 2]));
        assert_eq!(queued(&result.state), report.updates);
        assert_eq!(
            report.updates,
            vec![
                CounterUpdate::new(Counter::Points, 19),
                CounterUpdate::new(Counter::WordsFound, 2),
                CounterUpdate::new(Counter::PerfectWords, 1),
                CounterUpdate::new(Counter::PlayedStreak, 1),
                CounterUpdate::new(Counter::PerfectStreak, 1),
            ]
        );
    }

    #[test]
    fn second_run_yields_no_updates() {
        let history = [entry(1, "p1", 1), entry(2, "p2", 1)];
        let records = [
            record(0, "p1", "cage", true),
            record(1, "p2", "fabcedg", true),
        ];

        let first = aggregate(&records, &history, &synced_below(2));
        let second = aggregate(&records, &history, &first.state);

        assert!(second.report.is_empty());
        assert_eq!(second.report.points_delta, 0);
        assert_eq!(second.report.processed, 0);
        assert_eq!(second.state, first.state);
    }

    #[test]
    fn unsynced_records_wait_for_reconciliation() {
        let history = [entry(1, "p1", 0)];
        let records = [
            record(0, "p1", "cage", true),
            record(1, "p1", "bag", true),
        ];

        let first = aggregate(&records, &history, &synced_below(1));
        assert_eq!(first.report.points_delta, 2);
        assert_eq!(first.report.unsynced, 1);
        assert!(!first.state.is_counted(1));

        let mut state = first.state;
        state.reconciled_below = 2;
        let second = aggregate(&records, &history, &state);
        assert_eq!(second.report.points_delta, 1);
        assert_eq!(second.report.unsynced, 0);
    }

    #[test]
    fn duplicate_word_scores_once() {
        let history = [entry(1, "p1", 0)];
        let records = [
            record(0, "p1", "cage", true),
            record(1, "p1", "CAGE", true),
        ];

        let first = aggregate(&records[..1], &history, &synced_below(2));
        let second = aggregate(&records, &history, &first.state);

        assert_eq!(first.report.points_delta, 2);
        assert_eq!(second.report.points_delta, 0);
        assert_eq!(second.report.processed, 1);
    }

    #[test]
    fn adopted_copy_blocks_older_local_duplicate() {
        let history = [entry(1, "p1", 0)];
        let records = [
            record(0, "p1", "cage", true),
            record(4, "p1", "cage", true),
        ];
        let state = SyncState {
            counted: BTreeSet::from([4]),
            ..synced_below(5)
        };

        let result = aggregate(&records, &history, &state);
        assert_eq!(result.report.points_delta, 0);
        assert_eq!(result.report.words_found_delta, 0);
        assert_eq!(result.report.processed, 1);
        assert!(result.state.is_counted(0));
    }

    #[test]
    fn unknown_puzzles_are_deferred() {
        let records = [record(0, "p9", "cage", true)];

        let first = aggregate(&records, &[], &synced_below(1));
        assert_eq!(first.report.deferred, 1);
        assert!(first.state.counted.is_empty());

        let history = [entry(3, "p9", 0)];
        let second = aggregate(&records, &history, &first.state);
        assert_eq!(second.report.deferred, 0);
        assert_eq!(second.report.points_delta, 2);
    }

    #[test]
    fn streaks_are_reported_as_new_bests() {
        let history = [
            entry(1, "p1", 0),
            entry(2, "p2", 0),
            entry(3, "p3", 0),
            entry(5, "p5", 0),
        ];
        let records = [
            record(0, "p1", "cage", true),
            record(1, "p2", "cage", true),
            record(2, "p3", "cage", true),
            record(3, "p5", "cage", true),
        ];

        let first = aggregate(&records[..2], &history, &synced_below(4));
        assert_eq!(first.report.longest_played_streak, 2);
        assert!(
            first
                .report
                .updates
                .contains(&CounterUpdate::new(Counter::PlayedStreak, 2))
        );

        let second = aggregate(&records, &history, &first.state);
        assert_eq!(second.report.longest_played_streak, 3);
        assert!(
            second
                .report
                .updates
                .contains(&CounterUpdate::new(Counter::PlayedStreak, 3))
        );
        assert_eq!(second.state.best_played_streak, 3);

        let third = aggregate(&records, &history, &second.state);
        assert!(third.report.updates.is_empty());
    }

    #[test]
    fn incomplete_perfect_day_is_not_perfect() {
        let history = [entry(1, "p1", 2)];
        let records = [record(0, "p1", "fabcedg", true)];

        let result = aggregate(&records, &history, &synced_below(1));
        assert_eq!(result.report.perfect_words_delta, 1);
        assert_eq!(result.report.longest_perfect_streak, 0);
    }
}
