use std::collections::HashMap;

use chrono::NaiveDate;

use super::{DatedEvent, EventStatus};

/// Count consecutive completed days walking backward from `today`.
///
/// Skipped days are transparent: they neither add to the streak nor end it.
/// A day with no entry ends the walk, with one exception: if `today` itself
/// has no entry, the walk steps back to yesterday once, so a streak that is
/// still alive through yesterday is not reported as broken before today has
/// been logged. The tolerance only ever applies to `today`.
pub fn current_streak(events: &[DatedEvent], today: NaiveDate) -> u32 {
    if events.is_empty() {
        return 0;
    }

    let by_date: HashMap<NaiveDate, EventStatus> =
        events.iter().map(|e| (e.date, e.status)).collect();

    let mut streak = 0u32;
    let mut tolerance_available = true;
    let mut day = today;

    loop {
        match by_date.get(&day) {
            Some(EventStatus::Completed) => streak += 1,
            Some(EventStatus::Skipped) => {}
            None if streak == 0 && tolerance_available => {}
            None => break,
        }

        // Only the very first day of the walk may be missing.
        tolerance_available = false;

        let Some(prev) = day.pred_opt() else {
            break;
        };
        day = prev;
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn completed(s: &str) -> DatedEvent {
        DatedEvent::completed(d(s))
    }

    fn skipped(s: &str) -> DatedEvent {
        DatedEvent::skipped(d(s))
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(current_streak(&[], d("2024-03-10")), 0);
    }

    #[test]
    fn counts_consecutive_days_ending_today() {
        let events = [
            completed("2024-03-10"),
            completed("2024-03-09"),
            completed("2024-03-08"),
        ];
        assert_eq!(current_streak(&events, d("2024-03-10")), 3);
    }

    #[test]
    fn unlogged_today_falls_back_to_yesterday() {
        let events = [
            completed("2024-03-09"),
            skipped("2024-03-08"),
            completed("2024-03-07"),
        ];
        assert_eq!(current_streak(&events, d("2024-03-10")), 2);
    }

    #[test]
    fn unlogged_today_and_yesterday_is_zero() {
        let events = [completed("2024-03-08"), completed("2024-03-07")];
        assert_eq!(current_streak(&events, d("2024-03-10")), 0);
    }

    #[test]
    fn skip_only_today_is_zero() {
        let events = [skipped("2024-03-10")];
        assert_eq!(current_streak(&events, d("2024-03-10")), 0);
    }

    #[test]
    fn tolerance_is_not_granted_after_a_skipped_today() {
        // Today is logged (as a skip), so yesterday's gap ends the walk even
        // though a completion sits right behind it.
        let events = [skipped("2024-03-10"), completed("2024-03-08")];
        assert_eq!(current_streak(&events, d("2024-03-10")), 0);
    }

    #[test]
    fn skipped_yesterday_after_unlogged_today_keeps_walking() {
        let events = [skipped("2024-03-09"), completed("2024-03-08")];
        assert_eq!(current_streak(&events, d("2024-03-10")), 1);
    }

    #[test]
    fn gap_after_counting_ends_the_streak() {
        let events = [
            completed("2024-03-10"),
            completed("2024-03-09"),
            completed("2024-03-07"),
            completed("2024-03-06"),
        ];
        assert_eq!(current_streak(&events, d("2024-03-10")), 2);
    }

    #[test]
    fn long_skip_runs_are_transparent() {
        let events = [
            completed("2024-03-10"),
            skipped("2024-03-09"),
            skipped("2024-03-08"),
            skipped("2024-03-07"),
            completed("2024-03-06"),
        ];
        assert_eq!(current_streak(&events, d("2024-03-10")), 2);
    }

    #[test]
    fn future_events_are_ignored() {
        let events = [completed("2024-03-11"), completed("2024-03-10")];
        assert_eq!(current_streak(&events, d("2024-03-10")), 1);
    }

    #[test]
    fn adding_completions_from_today_never_shrinks_the_streak() {
        let today = d("2024-03-10");
        let mut events = Vec::new();
        let mut previous = 0;
        let mut day = today;
        for _ in 0..10 {
            events.push(DatedEvent::completed(day));
            let streak = current_streak(&events, today);
            assert!(streak >= previous);
            previous = streak;
            day = day.pred_opt().unwrap();
        }
        assert_eq!(previous, 10);
    }
}
