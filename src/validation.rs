/// Field validation for habit and entry input.
///
/// Every mutation runs through these checks before it reaches the store, so
/// the statistics engine only ever sees well-formed data:
///
/// 1. **Name** — trimmed, 1–100 characters, not blank.
/// 2. **Color** — `#RRGGBB` hex.
/// 3. **Lengths** — description and notes ≤ 500, icon ≤ 50.
/// 4. **Dates** — `YYYY-MM-DD` that names a real calendar day.
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

pub const NAME_MAX_CHARS: usize = 100;
pub const TEXT_MAX_CHARS: usize = 500;
pub const ICON_MAX_CHARS: usize = 50;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color regex must compile"));

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex must compile"));

/// A rejected field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a habit name and return it trimmed.
pub fn name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("name", "name cannot be blank"));
    }
    max_chars("name", trimmed, NAME_MAX_CHARS)?;
    Ok(trimmed.to_string())
}

/// Validate a `#RRGGBB` color.
pub fn color(raw: &str) -> Result<(), ValidationError> {
    if COLOR_RE.is_match(raw) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "color",
            format!("expected #RRGGBB hex color, got '{raw}'"),
        ))
    }
}

pub fn description(raw: &str) -> Result<(), ValidationError> {
    max_chars("description", raw, TEXT_MAX_CHARS)
}

pub fn icon(raw: &str) -> Result<(), ValidationError> {
    max_chars("icon", raw, ICON_MAX_CHARS)
}

pub fn notes(raw: &str) -> Result<(), ValidationError> {
    max_chars("notes", raw, TEXT_MAX_CHARS)
}

/// Parse a `YYYY-MM-DD` date, rejecting other layouts and impossible days.
pub fn date(raw: &str) -> Result<NaiveDate, ValidationError> {
    if !DATE_RE.is_match(raw) {
        return Err(ValidationError::new(
            "date",
            format!("expected YYYY-MM-DD, got '{raw}'"),
        ));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ValidationError::new("date", format!("'{raw}' is not a calendar date")))
}

fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters (got {len})"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        assert_eq!(name("  Read  ").unwrap(), "Read");
    }

    #[test]
    fn rejects_blank_names() {
        assert!(name("").is_err());
        assert!(name("   \t").is_err());
    }

    #[test]
    fn name_length_counts_chars_after_trim() {
        let hundred = "a".repeat(100);
        assert!(name(&format!("  {hundred}  ")).is_ok());
        assert!(name(&"a".repeat(101)).is_err());
        // Multi-byte characters count once each.
        assert!(name(&"é".repeat(100)).is_ok());
    }

    #[test]
    fn color_must_be_hex() {
        assert!(color("#10B981").is_ok());
        assert!(color("#abcdef").is_ok());
        assert!(color("10B981").is_err());
        assert!(color("#10B98").is_err());
        assert!(color("#GGGGGG").is_err());
    }

    #[test]
    fn text_limits() {
        assert!(description(&"x".repeat(500)).is_ok());
        assert!(description(&"x".repeat(501)).is_err());
        assert!(icon(&"x".repeat(50)).is_ok());
        assert!(icon(&"x".repeat(51)).is_err());
        assert!(notes(&"x".repeat(501)).is_err());
    }

    #[test]
    fn date_accepts_iso_days() {
        assert_eq!(
            date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn date_rejects_bad_layouts_and_days() {
        assert!(date("2024-2-29").is_err());
        assert!(date("2024/02/29").is_err());
        assert!(date("2023-02-29").is_err());
        assert!(date("2024-13-01").is_err());
        assert!(date("2024-03-10T00:00:00").is_err());
    }

    #[test]
    fn error_message_names_the_field() {
        let err = color("red").unwrap_err();
        assert_eq!(err.field, "color");
        assert!(err.to_string().starts_with("color: "));
    }
}
