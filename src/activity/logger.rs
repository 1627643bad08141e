use std::fmt;
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    HabitCreated,
    HabitUpdated,
    HabitArchived,
    HabitDeleted,
    EntryCompleted,
    EntrySkipped,
    EntryRemoved,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Self::HabitCreated,
        Self::HabitUpdated,
        Self::HabitArchived,
        Self::HabitDeleted,
        Self::EntryCompleted,
        Self::EntrySkipped,
        Self::EntryRemoved,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HabitCreated => "habit_created",
            Self::HabitUpdated => "habit_updated",
            Self::HabitArchived => "habit_archived",
            Self::HabitDeleted => "habit_deleted",
            Self::EntryCompleted => "entry_completed",
            Self::EntrySkipped => "entry_skipped",
            Self::EntryRemoved => "entry_removed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    pub action: Action,
    pub habit_id: u64,
    /// Habit name at the time of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_name: Option<String>,
    /// Entry date, for entry events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ActivityEvent {
    pub fn habit(action: Action, habit_id: u64, habit_name: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action,
            habit_id,
            habit_name: Some(habit_name.to_string()),
            date: None,
        }
    }

    pub fn entry(action: Action, habit_id: u64, habit_name: &str, date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::habit(action, habit_id, habit_name)
        }
    }
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Append-only JSONL activity log at a fixed path.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured log, or `None` when logging is disabled.
    pub fn from_config(config: &LoggingConfig) -> Option<Self> {
        config.resolved_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event. Best-effort; failures are silently ignored.
    pub fn record(&self, event: &ActivityEvent) {
        let _ = self.append(event);
    }

    fn append(&self, event: &ActivityEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read all events, oldest first.
    ///
    /// Silently skips malformed lines. Returns an empty vec if the file does
    /// not exist or cannot be read.
    pub fn read_all(&self) -> Vec<ActivityEvent> {
        let Ok(file) = fs::File::open(&self.path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEvent>(&line).ok())
            .collect()
    }

    /// The most recent `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ActivityEvent> {
        let mut events = self.read_all();
        events.reverse();
        events.truncate(limit);
        events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reads_back_events() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("logs").join("activity.jsonl"));

        log.record(&ActivityEvent::habit(Action::HabitCreated, 1, "Read"));
        log.record(&ActivityEvent::entry(
            Action::EntryCompleted,
            1,
            "Read",
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        ));

        let events = log.read_all();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, Action::HabitCreated);
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2024, 3, 10));
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.jsonl"));
        for id in 1..=5 {
            log.record(&ActivityEvent::habit(Action::HabitCreated, id, "h"));
        }

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].habit_id, 5);
        assert_eq!(recent[1].habit_id, 4);
    }

    #[test]
    fn skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let good = serde_json::to_string(&ActivityEvent::habit(Action::HabitDeleted, 3, "x")).unwrap();
        fs::write(&path, format!("not json\n{good}\n{{\"action\":\"nope\"}}\n")).unwrap();

        let events = ActivityLog::new(&path).read_all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, Action::HabitDeleted);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("absent.jsonl"));
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn event_serializes_compactly() {
        let event = ActivityEvent::habit(Action::HabitArchived, 7, "Run");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"action\":\"habit_archived\""));
        assert!(json.contains("\"habit_id\":7"));
        assert!(!json.contains("\"date\""));
    }

    #[test]
    fn action_names_match_serde() {
        for action in Action::ALL {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, action.as_str());
            assert_eq!(action.to_string(), action.as_str());
            let back: Action = serde_json::from_value(json).unwrap();
            assert_eq!(back, action);
        }
    }

    #[test]
    fn disabled_config_yields_no_log() {
        let config = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(ActivityLog::from_config(&config).is_none());
    }
}
