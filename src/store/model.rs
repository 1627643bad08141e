//! Persisted habit records and the request / response shapes built on them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::stats::{self, DatedEvent, EventStatus, HabitContext, StatisticsResult};

/// Color used when a habit is created without one.
pub const DEFAULT_COLOR: &str = "#10B981";

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// A trackable daily habit with its full entry history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Habit {
    /// The calendar day the habit was created on.
    pub fn created_date(&self) -> NaiveDate {
        self.created_at.date()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// The entry logged for `date`, if any.
    pub fn entry_on(&self, date: NaiveDate) -> Option<&Entry> {
        self.entries.iter().find(|e| e.date == date)
    }

    /// Entries as engine events.
    pub fn events(&self) -> Vec<DatedEvent> {
        self.entries.iter().map(Entry::event).collect()
    }

    /// Derived statistics as of `today`.
    pub fn statistics(&self, today: NaiveDate) -> StatisticsResult {
        let events = self.events();
        let context = HabitContext {
            created_date: self.created_date(),
            events: &events,
        };
        stats::assemble(&context, today)
    }
}

/// One completed or skipped day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Entry {
    pub fn event(&self) -> DatedEvent {
        DatedEvent {
            date: self.date,
            status: self.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Fields for a new habit. Unset color falls back to the configured default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHabit {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Partial update of a habit. Only the fields that are set change.
///
/// `description` and `icon` distinguish "leave alone" (`None`) from "clear"
/// (`Some(None)`), so a JSON `null` removes the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HabitPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.icon.is_none()
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A day to mark as completed or skipped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEntry {
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Why the day was skipped. Stored as the note when no note is given.
    #[serde(default)]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A habit's static fields merged with its statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitView {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    #[serde(flatten)]
    pub stats: StatisticsResult,
    pub created_at: NaiveDateTime,
    pub archived_at: Option<NaiveDateTime>,
}

impl HabitView {
    pub fn build(habit: &Habit, today: NaiveDate) -> Self {
        Self {
            id: habit.id,
            name: habit.name.clone(),
            description: habit.description.clone(),
            color: habit.color.clone(),
            icon: habit.icon.clone(),
            stats: habit.statistics(today),
            created_at: habit.created_at,
            archived_at: habit.archived_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
