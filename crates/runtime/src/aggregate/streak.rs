//! Calendar-day streaks.

use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Length of the longest run of calendar-consecutive days.
///
/// Input may be unsorted and contain duplicates.
pub fn longest_run(days: impl IntoIterator<Item = NaiveDate>) -> u32 {
    let days: BTreeSet<NaiveDate> = days.into_iter().collect();

    let mut longest = 0u32;
    let mut current = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        current = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == day => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }

    longest
}
