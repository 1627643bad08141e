use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned by [`Store`](super::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("habit not found: {0}")]
    HabitNotFound(u64),

    #[error("habit {habit_id} has no entry on {date}")]
    EntryNotFound { habit_id: u64, date: NaiveDate },

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("store I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error refers to a habit or entry that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HabitNotFound(_) | Self::EntryNotFound { .. })
    }
}
