use chrono::NaiveDate;

use super::DatedEvent;

/// True when `today` has a completed entry. A skip does not count.
pub fn completed_today(events: &[DatedEvent], today: NaiveDate) -> bool {
    events.iter().any(|e| e.date == today && e.is_completed())
}
