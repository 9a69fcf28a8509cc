//! Union of stored records with an incoming guess set.

use std::collections::{BTreeSet, HashSet};

use super::types::{Guess, GuessRecord, SyncState};
use crate::types::GuessId;

/// Merges `incoming` into `existing` without removing anything.
///
/// Existing records keep their ids and order. Guesses not already present are
/// appended in canonical order with ids drawn from `next_id`, and those ids
/// are added to `state.counted`.
///
/// `state.reconciled_below` moves to the first existing record missing from
/// `incoming` (one appended while the merge was in flight), or past every
/// record when there is none.
pub(crate) fn union_records(
    existing: &[GuessRecord],
    incoming: Vec<Guess>,
    next_id: &mut GuessId,
    state: &mut SyncState,
) -> Vec<GuessRecord> {
    let incoming: HashSet<Guess> = incoming.into_iter().collect();
    let first_missing = existing
        .iter()
        .filter(|record| !incoming.contains(&record.guess))
        .map(|record| record.id)
        .min();

    let known: HashSet<&Guess> = existing.iter().map(|record| &record.guess).collect();
    let fresh: BTreeSet<Guess> = incoming
        .into_iter()
        .filter(|guess| !known.contains(guess))
        .collect();

    let mut records = existing.to_vec();
    records.reserve(fresh.len());
    for guess in fresh {
        state.counted.insert(*next_id);
        records.push(GuessRecord::new(*next_id, guess));
        *next_id += 1;
    }
    state.reconciled_below = first_missing.unwrap_or(*next_id);
    records
}
