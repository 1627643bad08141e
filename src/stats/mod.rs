//! Habit statistics engine.
//!
//! Turns a habit's creation date and its sparse, per-date log of completion
//! and skip events into four derived metrics:
//!
//! - **current streak** — [`current_streak`], walking backward from today
//! - **longest streak** — [`longest_streak`], scanning all completed dates
//! - **completion rate** — [`completion_rate`], normalized against the days
//!   since creation
//! - **done today** — [`completed_today`]
//!
//! Every function here is a pure, read-only transform of its arguments. The
//! caller supplies the reference "today" date so results never depend on the
//! clock or time zone of the machine computing them.

mod current;
mod longest;
mod rate;
mod today;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use current::current_streak;
pub use longest::longest_streak;
pub use rate::completion_rate;
pub use today::completed_today;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Whether a day was completed or explicitly skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Completed,
    Skipped,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown event status: {other}")),
        }
    }
}

/// A single dated completion or skip for one habit.
///
/// Callers guarantee at most one event per date per habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatedEvent {
    pub date: NaiveDate,
    pub status: EventStatus,
}

impl DatedEvent {
    pub fn completed(date: NaiveDate) -> Self {
        Self {
            date,
            status: EventStatus::Completed,
        }
    }

    pub fn skipped(date: NaiveDate) -> Self {
        Self {
            date,
            status: EventStatus::Skipped,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == EventStatus::Completed
    }
}

/// Everything the engine needs to know about one habit.
#[derive(Debug, Clone, Copy)]
pub struct HabitContext<'a> {
    /// Calendar date the habit was established.
    pub created_date: NaiveDate,
    /// Events in any order.
    pub events: &'a [DatedEvent],
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Derived statistics for one habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Percentage rounded to one decimal place. Values above 100.0 indicate
    /// inconsistent upstream data and are reported as-is.
    pub completion_rate: f64,
    pub completed_today: bool,
}

/// Compute all four statistics for a habit as of `today`.
pub fn assemble(habit: &HabitContext<'_>, today: NaiveDate) -> StatisticsResult {
    StatisticsResult {
        current_streak: current_streak(habit.events, today),
        longest_streak: longest_streak(habit.events),
        completion_rate: completion_rate(habit.created_date, habit.events, today),
        completed_today: completed_today(habit.events, today),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let ctx = HabitContext {
            created_date: d("2024-03-01"),
            events: &[],
        };
        let stats = assemble(&ctx, d("2024-03-10"));
        assert_eq!(stats, StatisticsResult::default());
    }

    #[test]
    fn assembles_all_four_metrics() {
        let events = [
            DatedEvent::completed(d("2024-03-10")),
            DatedEvent::completed(d("2024-03-09")),
            DatedEvent::completed(d("2024-03-08")),
        ];
        let ctx = HabitContext {
            created_date: d("2024-03-01"),
            events: &events,
        };
        let stats = assemble(&ctx, d("2024-03-10"));
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.completion_rate, 30.0);
        assert!(stats.completed_today);
    }

    #[test]
    fn event_status_parses_and_displays() {
        assert_eq!("completed".parse(), Ok(EventStatus::Completed));
        assert_eq!("skipped".parse(), Ok(EventStatus::Skipped));
        assert!("done".parse::<EventStatus>().is_err());
        assert_eq!(EventStatus::Skipped.to_string(), "skipped");
    }

    #[test]
    fn statistics_serialize_with_snake_case_fields() {
        let stats = StatisticsResult {
            current_streak: 2,
            longest_streak: 5,
            completion_rate: 42.9,
            completed_today: false,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"current_streak\":2"));
        assert!(json.contains("\"completion_rate\":42.9"));
        assert!(json.contains("\"completed_today\":false"));
    }
}
