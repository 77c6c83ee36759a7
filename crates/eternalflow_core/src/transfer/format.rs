//! JSON import/export document handling.
//!
//! # Responsibility
//! - Build pretty-printed export envelopes with a dated file name.
//! - Parse bare-array or envelope imports into validated candidates.
//!
//! # Invariants
//! - Invalid records are dropped individually, never fail the whole batch.
//! - A batch with zero valid records is an `ImportError`.
//! - Export writes dates as epoch milliseconds so they round-trip exactly.

use crate::model::event::{
    check_epoch_millis, parse_instant, validate_title, Event, EventId, ValidationError,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Current export document version.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

const EXPORT_FILE_PREFIX: &str = "EternalFlow-export-";

/// Export document layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub version: u32,
    /// RFC 3339 UTC instant of the export.
    pub timestamp: String,
    pub events: Vec<Event>,
}

/// Ready-to-write export: document plus suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSnapshot {
    pub file_name: String,
    pub envelope: ExportEnvelope,
}

impl ExportSnapshot {
    pub fn is_empty(&self) -> bool {
        self.envelope.events.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.envelope)
    }
}

/// `EternalFlow-export-YYYY-MM-DD.json` for the UTC day of `now_ms`.
pub fn export_file_name(now_ms: i64) -> String {
    let day = DateTime::<Utc>::from_timestamp_millis(now_ms)
        .unwrap_or_default()
        .format("%Y-%m-%d");
    format!("{EXPORT_FILE_PREFIX}{day}.json")
}

/// Snapshots `events` for export.
pub fn build_export(events: &[Event], now_ms: i64) -> ExportSnapshot {
    let timestamp = DateTime::<Utc>::from_timestamp_millis(now_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    ExportSnapshot {
        file_name: export_file_name(now_ms),
        envelope: ExportEnvelope {
            version: EXPORT_FORMAT_VERSION,
            timestamp,
            events: events.to_vec(),
        },
    }
}

/// One validated imported record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    /// Existing id, kept when present.
    pub id: Option<EventId>,
    pub title: String,
    pub date: i64,
    pub created_at: Option<i64>,
}

/// Parsed import batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBatch {
    pub candidates: Vec<ImportCandidate>,
    /// Records rejected by validation.
    pub dropped: usize,
}

/// Whole-document import failure.
#[derive(Debug)]
pub enum ImportError {
    InvalidJson(serde_json::Error),
    UnexpectedShape(&'static str),
    NoValidEvents { dropped: usize },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "import file is not valid JSON: {err}"),
            Self::UnexpectedShape(detail) => write!(f, "unexpected import shape: {detail}"),
            Self::NoValidEvents { dropped } => {
                write!(f, "no valid events found in import ({dropped} dropped)")
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) => Some(err),
            Self::UnexpectedShape(_) | Self::NoValidEvents { .. } => None,
        }
    }
}

/// Parses and validates an import document.
pub fn parse_import(raw: &str) -> Result<ImportBatch, ImportError> {
    let document: Value = serde_json::from_str(raw).map_err(ImportError::InvalidJson)?;
    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut envelope) => match envelope.remove("events") {
            Some(Value::Array(records)) => records,
            Some(_) => return Err(ImportError::UnexpectedShape("`events` is not an array")),
            None => return Err(ImportError::UnexpectedShape("object without `events`")),
        },
        _ => {
            return Err(ImportError::UnexpectedShape(
                "expected an array or an export envelope",
            ))
        }
    };

    let total = records.len();
    let candidates: Vec<ImportCandidate> = records
        .iter()
        .filter_map(|record| record.as_object().and_then(parse_record))
        .collect();
    let dropped = total - candidates.len();

    if candidates.is_empty() {
        return Err(ImportError::NoValidEvents { dropped });
    }
    Ok(ImportBatch {
        candidates,
        dropped,
    })
}

fn parse_record(record: &Map<String, Value>) -> Option<ImportCandidate> {
    let id = match record.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(EventId::parse(text.as_str())?),
        // Integer keys come from auto-increment stores of older exports.
        Some(Value::Number(number)) if number.is_u64() || number.is_i64() => {
            Some(EventId::parse(number.to_string())?)
        }
        Some(_) => return None,
    };

    let title = validate_title(record.get("title")?.as_str()?).ok()?;
    let date = parse_instant_value(record.get("date")?).ok()?;
    let created_at = record
        .get("createdAt")
        .and_then(|value| parse_instant_value(value).ok());

    Some(ImportCandidate {
        id,
        title,
        date,
        created_at,
    })
}

/// Reads an instant stored as epoch-millisecond number or date string.
fn parse_instant_value(value: &Value) -> Result<i64, ValidationError> {
    match value {
        Value::String(text) => parse_instant(text),
        Value::Number(number) => {
            if let Some(millis) = number.as_i64() {
                return check_epoch_millis(millis);
            }
            match number.as_f64() {
                Some(millis) if millis.fract() == 0.0 && millis.abs() < 9.0e15 => {
                    // Bounded above, so the cast is exact.
                    check_epoch_millis(millis as i64)
                }
                _ => Err(ValidationError::InvalidDate(number.to_string())),
            }
        }
        Value::Null => Err(ValidationError::MissingDate),
        other => Err(ValidationError::InvalidDate(other.to_string())),
    }
}
