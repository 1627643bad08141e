use std::collections::HashSet;

use chrono::NaiveDate;

use super::{DatedEvent, EventStatus};

/// Length of the longest run of completed days in the whole history.
///
/// Consecutive completed dates extend the run. A gap of several days keeps
/// the run alive only when every day inside the gap is skipped; a single
/// unlogged day in the gap resets the run to 1. Skipped days never add to
/// the length themselves.
pub fn longest_streak(events: &[DatedEvent]) -> u32 {
    let mut completed: Vec<NaiveDate> = events
        .iter()
        .filter(|e| e.is_completed())
        .map(|e| e.date)
        .collect();

    if completed.is_empty() {
        return 0;
    }

    completed.sort_unstable();
    completed.dedup();

    let skipped: HashSet<NaiveDate> = events
        .iter()
        .filter(|e| e.status == EventStatus::Skipped)
        .map(|e| e.date)
        .collect();

    let mut longest = 1u32;
    let mut run = 1u32;

    for pair in completed.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let gap = (curr - prev).num_days();

        if gap == 1 || gap_fully_skipped(prev, curr, &skipped) {
            run += 1;
        } else {
            run = 1;
        }

        longest = longest.max(run);
    }

    longest
}

/// Whether every day strictly between `prev` and `curr` is a skip.
fn gap_fully_skipped(prev: NaiveDate, curr: NaiveDate, skipped: &HashSet<NaiveDate>) -> bool {
    prev.iter_days()
        .skip(1)
        .take_while(|day| *day < curr)
        .all(|day| skipped.contains(&day))
}
