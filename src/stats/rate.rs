use chrono::NaiveDate;

use super::DatedEvent;

/// Percentage of days since `created_date` (inclusive of both ends) on which
/// the habit was completed, rounded to one decimal place.
///
/// Completions dated before the habit was created are not counted. Returns
/// 0.0 when `today` precedes the creation date. The result is not clamped:
/// more completions than elapsed days yields a rate above 100.0.
pub fn completion_rate(created_date: NaiveDate, events: &[DatedEvent], today: NaiveDate) -> f64 {
    let total_days = (today - created_date).num_days() + 1;
    if total_days <= 0 {
        return 0.0;
    }

    let completed = events
        .iter()
        .filter(|e| e.is_completed() && e.date >= created_date)
        .count();

    round_one_decimal(completed as f64 / total_days as f64 * 100.0)
}

/// Round to the first decimal place.
///
/// Rounds the exact binary value, ties to even. Scaling by 10 first would
/// round the product and can move a value across a tie.
fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
