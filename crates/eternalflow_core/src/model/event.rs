//! Event domain model.
//!
//! # Responsibility
//! - Define the single persisted record tracked by countdown views.
//! - Own write-boundary validation for titles and target instants.
//!
//! # Invariants
//! - `id` is stable and never reused for another event.
//! - `title` is trimmed, non-empty and at most [`MAX_TITLE_CHARS`] scalar values.
//! - `date` is a valid instant in Unix epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound for event titles, counted in Unicode scalar values.
pub const MAX_TITLE_CHARS: usize = 50;

/// Past dates older than this need an explicit user confirmation.
pub const PAST_GRACE_MS: i64 = 60_000;

/// Opaque, stable identifier of one event.
///
/// New events get UUID v4 text; imported events keep whatever non-empty id
/// they were exported with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier, rejecting blank values.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical persisted event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// Target instant, Unix epoch milliseconds.
    pub date: i64,
    /// Creation instant, Unix epoch milliseconds. Sort key only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Event {
    /// Builds a new event with a generated id.
    ///
    /// Callers are expected to pass values already checked by
    /// [`validate_title`] and [`parse_instant`].
    pub fn new(title: impl Into<String>, date: i64, created_at: i64) -> Self {
        Self {
            id: EventId::generate(),
            title: title.into(),
            date,
            created_at: Some(created_at),
        }
    }

    /// Whether the target instant is still ahead of `now_ms`.
    ///
    /// `date == now` already counts as happened.
    pub fn is_upcoming(&self, now_ms: i64) -> bool {
        self.date > now_ms
    }

    /// Re-checks record invariants, used when reading persisted rows.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        if DateTime::<Utc>::from_timestamp_millis(self.date).is_none() {
            return Err(ValidationError::InvalidDate(self.date.to_string()));
        }
        Ok(())
    }
}

/// Partial replacement applied by an update.
///
/// `id` and `created_at` are never part of a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<i64>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none()
    }

    /// Applies the patch in place.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(date) = self.date {
            event.date = date;
        }
    }
}

/// Write-boundary validation failure, mapped to one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooLong { chars: usize, max: usize },
    MissingDate,
    InvalidDate(String),
}

impl ValidationError {
    /// Name of the form field this error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::MissingDate | Self::InvalidDate(_) => "date",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "title has {chars} characters, maximum is {max}")
            }
            Self::MissingDate => write!(f, "date is required"),
            Self::InvalidDate(raw) => write!(f, "date `{raw}` is not a valid instant"),
        }
    }
}

impl Error for ValidationError {}

/// Trims and validates a user-supplied title.
pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            chars,
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Cuts live input down to the title bound, mirroring a length-limited field.
pub fn clamp_title(raw: &str) -> String {
    raw.chars().take(MAX_TITLE_CHARS).collect()
}

/// Parses a user or file supplied instant into epoch milliseconds.
///
/// Accepted shapes:
/// - RFC 3339 (`2030-01-01T00:00:00Z`, `2030-01-01T03:00:00+03:00`)
/// - naive date-time (`2030-01-01T10:30`, `2030-01-01T10:30:15`, also with a space)
/// - plain date (`2030-01-01`), read as midnight
///
/// Naive forms are read as UTC.
pub fn parse_instant(raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingDate);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.timestamp_millis());
    }

    for pattern in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Ok(parsed.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().timestamp_millis());
        }
    }

    Err(ValidationError::InvalidDate(trimmed.to_string()))
}

/// Checks an epoch-millisecond value coming from a numeric field.
pub fn check_epoch_millis(value: i64) -> Result<i64, ValidationError> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .map(|_| value)
        .ok_or_else(|| ValidationError::InvalidDate(value.to_string()))
}

/// Whether saving `date_ms` should be confirmed as a deliberately past event.
pub fn needs_past_confirmation(date_ms: i64, now_ms: i64) -> bool {
    date_ms <= now_ms.saturating_sub(PAST_GRACE_MS)
}

#[cfg(test)]
mod tests {
    use super::{
        clamp_title, needs_past_confirmation, parse_instant, validate_title, Event, EventId,
        EventPatch, ValidationError, MAX_TITLE_CHARS,
    };

    #[test]
    fn title_is_trimmed_and_bounded_by_scalar_count() {
        assert_eq!(validate_title("  Отпуск  ").unwrap(), "Отпуск");
        let cyrillic = "я".repeat(MAX_TITLE_CHARS);
        assert!(validate_title(&cyrillic).is_ok());

        let err = validate_title(&"x".repeat(MAX_TITLE_CHARS + 1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TitleTooLong {
                chars: 51,
                max: MAX_TITLE_CHARS
            }
        );
        assert_eq!(validate_title(" \t ").unwrap_err(), ValidationError::EmptyTitle);
    }

    #[test]
    fn parse_instant_accepts_common_shapes() {
        let midnight = 1_893_456_000_000;
        assert_eq!(parse_instant("2030-01-01").unwrap(), midnight);
        assert_eq!(parse_instant("2030-01-01T00:00:00Z").unwrap(), midnight);
        assert_eq!(parse_instant("2030-01-01T03:00:00+03:00").unwrap(), midnight);
        assert_eq!(parse_instant("2030-01-01T00:01").unwrap(), midnight + 60_000);
        assert_eq!(parse_instant("2030-01-01 00:00:01").unwrap(), midnight + 1_000);
    }

    #[test]
    fn parse_instant_rejects_blank_and_garbage() {
        assert_eq!(parse_instant("  ").unwrap_err(), ValidationError::MissingDate);
        assert!(matches!(
            parse_instant("next tuesday"),
            Err(ValidationError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_instant("2030-02-30"),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn clamp_title_counts_scalars_not_bytes() {
        let long = "ж".repeat(60);
        assert_eq!(clamp_title(&long).chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn boundary_instant_is_not_upcoming() {
        let event = Event::new("now", 1_000, 0);
        assert!(!event.is_upcoming(1_000));
        assert!(event.is_upcoming(999));
    }

    #[test]
    fn past_confirmation_has_one_minute_grace() {
        assert!(!needs_past_confirmation(100_000, 100_000));
        assert!(!needs_past_confirmation(40_001, 100_000));
        assert!(needs_past_confirmation(40_000, 100_000));
    }

    #[test]
    fn patch_keeps_identity_fields() {
        let mut event = Event::new("old", 10, 5);
        let id = event.id.clone();
        EventPatch {
            title: Some("new".to_string()),
            date: None,
        }
        .apply_to(&mut event);
        assert_eq!(event.title, "new");
        assert_eq!(event.date, 10);
        assert_eq!(event.id, id);
        assert_eq!(event.created_at, Some(5));
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(EventId::parse("").is_none());
        assert!(EventId::parse("  ").is_none());
        assert_eq!(EventId::parse("42").unwrap().as_str(), "42");
    }
}
