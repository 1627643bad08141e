//! File-backed habit store.
//!
//! Holds every habit and its per-date entries in a single JSON document
//! (`<data_dir>/habits.json`). The store is the only writer of that file and
//! enforces the invariants the statistics engine relies on: validated
//! fields, real calendar dates, and at most one entry per date per habit.
//!
//! Each mutation is persisted before it returns, by writing a sibling temp
//! file and renaming it over the original. When an [`ActivityLog`] is
//! attached, each mutation is also recorded there.

mod error;
mod model;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::activity::{Action, ActivityEvent, ActivityLog};
use crate::config::StreaksConfig;
use crate::stats::EventStatus;
use crate::validation;

pub use error::StoreError;
pub use model::{DEFAULT_COLOR, Entry, Habit, HabitPatch, HabitView, NewEntry, NewHabit};

pub type StoreResult<T> = Result<T, StoreError>;

/// On-disk document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreData {
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default)]
    habits: Vec<Habit>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            habits: Vec::new(),
        }
    }
}

fn first_id() -> u64 {
    1
}

/// Local wall-clock time at second precision.
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Habits and entries backed by one JSON file.
pub struct Store {
    path: PathBuf,
    data: StoreData,
    default_color: String,
    activity: Option<ActivityLog>,
}

impl Store {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// A file that exists but cannot be parsed is an error; it is never
    /// silently replaced.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        Ok(Self {
            path,
            data,
            default_color: DEFAULT_COLOR.to_string(),
            activity: None,
        })
    }

    /// Open the store configured in `[general]`, with the configured
    /// activity log attached.
    pub fn open_default(config: &StreaksConfig) -> anyhow::Result<Self> {
        let path = config
            .general
            .store_path()
            .context("could not determine home directory for the habit store")?;
        let store = Self::open(&path)
            .with_context(|| format!("failed to open habit store at {}", path.display()))?
            .with_default_color(&config.general.default_color)
            .with_activity_log(ActivityLog::from_config(&config.logging));
        Ok(store)
    }

    /// Color assigned to habits created without one.
    pub fn with_default_color(mut self, color: &str) -> Self {
        if validation::color(color).is_ok() {
            self.default_color = color.to_string();
        }
        self
    }

    pub fn with_activity_log(mut self, log: Option<ActivityLog>) -> Self {
        self.activity = log;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -- Habits --

    /// Create a habit stamped with the current local time.
    pub fn create_habit(&mut self, new: NewHabit) -> StoreResult<Habit> {
        self.create_habit_at(new, now())
    }

    /// Create a habit with an explicit creation timestamp.
    pub fn create_habit_at(&mut self, new: NewHabit, created_at: NaiveDateTime) -> StoreResult<Habit> {
        let name = validation::name(&new.name)?;
        if let Some(description) = &new.description {
            validation::description(description)?;
        }
        let color = new.color.unwrap_or_else(|| self.default_color.clone());
        validation::color(&color)?;
        if let Some(icon) = &new.icon {
            validation::icon(icon)?;
        }

        let habit = Habit {
            id: self.data.next_id,
            name,
            description: new.description,
            color,
            icon: new.icon,
            created_at,
            archived_at: None,
            entries: Vec::new(),
        };

        let snapshot = self.data.clone();
        self.data.next_id += 1;
        self.data.habits.push(habit.clone());
        self.commit(snapshot)?;

        self.log(ActivityEvent::habit(Action::HabitCreated, habit.id, &habit.name));
        Ok(habit)
    }

    pub fn get_habit(&self, id: u64) -> StoreResult<&Habit> {
        self.data
            .habits
            .iter()
            .find(|h| h.id == id)
            .ok_or(StoreError::HabitNotFound(id))
    }

    /// Habits ordered by id. Archived habits are hidden unless requested.
    pub fn list_habits(&self, include_archived: bool) -> Vec<&Habit> {
        let mut habits: Vec<&Habit> = self
            .data
            .habits
            .iter()
            .filter(|h| include_archived || !h.is_archived())
            .collect();
        habits.sort_by_key(|h| h.id);
        habits
    }

    /// Apply the fields set in `patch`. Nothing is written if validation fails.
    pub fn update_habit(&mut self, id: u64, patch: HabitPatch) -> StoreResult<Habit> {
        let name = patch.name.as_deref().map(validation::name).transpose()?;
        if let Some(Some(description)) = &patch.description {
            validation::description(description)?;
        }
        if let Some(color) = &patch.color {
            validation::color(color)?;
        }
        if let Some(Some(icon)) = &patch.icon {
            validation::icon(icon)?;
        }

        let snapshot = self.data.clone();
        let habit = self.habit_mut(id)?;
        if let Some(name) = name {
            habit.name = name;
        }
        if let Some(description) = patch.description {
            habit.description = description;
        }
        if let Some(color) = patch.color {
            habit.color = color;
        }
        if let Some(icon) = patch.icon {
            habit.icon = icon;
        }
        let habit = habit.clone();
        self.commit(snapshot)?;

        self.log(ActivityEvent::habit(Action::HabitUpdated, habit.id, &habit.name));
        Ok(habit)
    }

    /// Permanently remove a habit and all of its entries.
    pub fn delete_habit(&mut self, id: u64) -> StoreResult<()> {
        let index = self
            .data
            .habits
            .iter()
            .position(|h| h.id == id)
            .ok_or(StoreError::HabitNotFound(id))?;
        let snapshot = self.data.clone();
        let habit = self.data.habits.remove(index);
        self.commit(snapshot)?;

        self.log(ActivityEvent::habit(Action::HabitDeleted, habit.id, &habit.name));
        Ok(())
    }

    /// Soft-delete a habit. Archiving twice keeps the first timestamp.
    pub fn archive_habit(&mut self, id: u64) -> StoreResult<Habit> {
        let snapshot = self.data.clone();
        let habit = self.habit_mut(id)?;
        if habit.archived_at.is_none() {
            habit.archived_at = Some(now());
        }
        let habit = habit.clone();
        self.commit(snapshot)?;

        self.log(ActivityEvent::habit(Action::HabitArchived, habit.id, &habit.name));
        Ok(habit)
    }

    // -- Entries --

    /// Mark a day completed or skipped, replacing any entry already on that
    /// date. For skips, `reason` becomes the note when no note is given.
    pub fn mark(&mut self, id: u64, new: NewEntry, status: EventStatus) -> StoreResult<Entry> {
        let date = validation::date(&new.date)?;
        let notes = match status {
            EventStatus::Completed => new.notes,
            EventStatus::Skipped => new.notes.or(new.reason),
        };
        if let Some(notes) = &notes {
            validation::notes(notes)?;
        }

        let entry = Entry {
            date,
            status,
            notes,
            created_at: now(),
        };

        let snapshot = self.data.clone();
        let habit = self.habit_mut(id)?;
        match habit.entries.iter_mut().find(|e| e.date == date) {
            Some(existing) => *existing = entry.clone(),
            None => habit.entries.push(entry.clone()),
        }
        let (habit_id, habit_name) = (habit.id, habit.name.clone());
        self.commit(snapshot)?;

        let action = match status {
            EventStatus::Completed => Action::EntryCompleted,
            EventStatus::Skipped => Action::EntrySkipped,
        };
        self.log(ActivityEvent::entry(action, habit_id, &habit_name, date));
        Ok(entry)
    }

    /// Remove the entry on `date`.
    pub fn remove_entry(&mut self, id: u64, date: NaiveDate) -> StoreResult<()> {
        let snapshot = self.data.clone();
        let habit = self.habit_mut(id)?;
        let index = habit
            .entries
            .iter()
            .position(|e| e.date == date)
            .ok_or(StoreError::EntryNotFound { habit_id: id, date })?;
        habit.entries.remove(index);
        let habit_name = habit.name.clone();
        self.commit(snapshot)?;

        self.log(ActivityEvent::entry(Action::EntryRemoved, id, &habit_name, date));
        Ok(())
    }

    /// A habit's entries, newest first.
    pub fn entries(&self, id: u64) -> StoreResult<Vec<&Entry>> {
        let habit = self.get_habit(id)?;
        let mut entries: Vec<&Entry> = habit.entries.iter().collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    // -- Views --

    pub fn view(&self, id: u64, today: NaiveDate) -> StoreResult<HabitView> {
        self.get_habit(id).map(|h| HabitView::build(h, today))
    }

    pub fn views(&self, include_archived: bool, today: NaiveDate) -> Vec<HabitView> {
        self.list_habits(include_archived)
            .into_iter()
            .map(|h| HabitView::build(h, today))
            .collect()
    }

    // -- Internal --

    fn habit_mut(&mut self, id: u64) -> StoreResult<&mut Habit> {
        self.data
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(StoreError::HabitNotFound(id))
    }

    /// Persist the current data, or restore `snapshot` if the write fails so
    /// memory never holds state that is not on disk.
    fn commit(&mut self, snapshot: StoreData) -> StoreResult<()> {
        self.save().inspect_err(|_| self.data = snapshot)
    }

    fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    fn log(&self, event: ActivityEvent) {
        if let Some(log) = &self.activity {
            log.record(&event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn new_habit(name: &str) -> NewHabit {
        NewHabit {
            name: name.to_string(),
            ..NewHabit::default()
        }
    }

    fn entry(date: &str) -> NewEntry {
        NewEntry {
            date: date.to_string(),
            ..NewEntry::default()
        }
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("habits.json")).unwrap();
        assert!(store.list_habits(true).is_empty());
    }

    #[test]
    fn open_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habits.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Store::open(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path().join("habits.json")).unwrap();
        let first = store.create_habit(new_habit("a")).unwrap();
        store.delete_habit(first.id).unwrap();
        let second = store.create_habit(new_habit("b")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn default_color_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path().join("habits.json"))
            .unwrap()
            .with_default_color("#123456");
        let habit = store.create_habit(new_habit("a")).unwrap();
        assert_eq!(habit.color, "#123456");
    }

    #[test]
    fn invalid_update_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path().join("habits.json")).unwrap();
        let habit = store.create_habit(new_habit("Read")).unwrap();

        let patch = HabitPatch {
            name: Some("Write".to_string()),
            color: Some("blue".to_string()),
            ..HabitPatch::default()
        };
        assert!(matches!(
            store.update_habit(habit.id, patch),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(store.get_habit(habit.id).unwrap().name, "Read");
    }

    #[test]
    fn skip_reason_becomes_note() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path().join("habits.json")).unwrap();
        let habit = store.create_habit(new_habit("Run")).unwrap();

        let skip = NewEntry {
            reason: Some("sick".to_string()),
            ..entry("2024-03-10")
        };
        let stored = store.mark(habit.id, skip, EventStatus::Skipped).unwrap();
        assert_eq!(stored.notes.as_deref(), Some("sick"));

        let done = NewEntry {
            reason: Some("ignored".to_string()),
            ..entry("2024-03-11")
        };
        let stored = store.mark(habit.id, done, EventStatus::Completed).unwrap();
        assert_eq!(stored.notes, None);
    }

    #[test]
    fn marking_unknown_habit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path().join("habits.json")).unwrap();
        let err = store
            .mark(42, entry("2024-03-10"), EventStatus::Completed)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn mutations_are_logged_when_a_log_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.jsonl"));
        let mut store = Store::open(dir.path().join("habits.json"))
            .unwrap()
            .with_activity_log(Some(log.clone()));

        let habit = store.create_habit(new_habit("Read")).unwrap();
        store
            .mark(habit.id, entry("2024-03-10"), EventStatus::Completed)
            .unwrap();
        store.archive_habit(habit.id).unwrap();

        let actions: Vec<Action> = log.read_all().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![Action::HabitCreated, Action::EntryCompleted, Action::HabitArchived]
        );
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habits.json");
        let mut store = Store::open(&path).unwrap();
        let habit = store.create_habit(new_habit("Read")).unwrap();

        // A directory where the temp file goes makes every save fail.
        let tmp = path.with_extension("json.tmp");
        fs::create_dir(&tmp).unwrap();

        assert!(matches!(
            store.create_habit(new_habit("Run")),
            Err(StoreError::Io { .. })
        ));
        assert!(store.archive_habit(habit.id).is_err());
        assert!(
            store
                .mark(habit.id, entry("2024-03-10"), EventStatus::Completed)
                .is_err()
        );
        assert!(store.delete_habit(habit.id).is_err());

        let names: Vec<&str> = store.list_habits(true).iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Read"]);
        let stored = store.get_habit(habit.id).unwrap();
        assert!(!stored.is_archived());
        assert!(stored.entries.is_empty());

        fs::remove_dir(&tmp).unwrap();
        let next = store.create_habit(new_habit("Run")).unwrap();
        assert_eq!(next.id, habit.id + 1);
    }

    #[test]
    fn no_temp_file_is_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habits.json");
        let mut store = Store::open(&path).unwrap();
        store.create_habit(new_habit("Read")).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
