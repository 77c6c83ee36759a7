//! Countdown display shaping.
//!
//! # Responsibility
//! - Combine decomposition and plural selection into display data.
//! - Provide both the structured per-cell breakdown and its sentence join.
//!
//! # Invariants
//! - Formatting is pure: identical inputs give identical output.
//! - `DisplayBreakdown::sentence` is derived only from the structured parts.

use crate::countdown::decompose::{decompose, TimeUnit};
use crate::countdown::plural::{plural_label, PluralForms};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt::{Display, Formatter};

const FUTURE_PREFIX: &str = "Через";
const PAST_SUFFIX: &str = "назад";

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Accusative forms, valid after both "через" and before "назад".
pub fn unit_forms(unit: TimeUnit) -> PluralForms {
    match unit {
        TimeUnit::Years => PluralForms::new("год", "года", "лет"),
        TimeUnit::Months => PluralForms::new("месяц", "месяца", "месяцев"),
        TimeUnit::Days => PluralForms::new("день", "дня", "дней"),
        TimeUnit::Hours => PluralForms::new("час", "часа", "часов"),
        TimeUnit::Minutes => PluralForms::new("минуту", "минуты", "минут"),
        TimeUnit::Seconds => PluralForms::new("секунду", "секунды", "секунд"),
    }
}

/// Whether the target is still ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStatus {
    Upcoming,
    Elapsed,
}

impl TimeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Elapsed => "elapsed",
        }
    }

    /// Card badge text.
    pub fn badge(self) -> &'static str {
        match self {
            Self::Upcoming => "Предстоящее",
            Self::Elapsed => "Прошедшее",
        }
    }
}

/// One display cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPart {
    pub unit: TimeUnit,
    pub value: u64,
    pub label: &'static str,
}

impl Display for DisplayPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.label)
    }
}

/// Formatted countdown for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBreakdown {
    pub status: TimeStatus,
    /// Trimmed, pluralized parts. Never empty.
    pub parts: Vec<DisplayPart>,
}

impl DisplayBreakdown {
    /// Joins the parts into a directional sentence.
    pub fn sentence(&self) -> String {
        let body = self
            .parts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        match self.status {
            TimeStatus::Upcoming => format!("{FUTURE_PREFIX} {body}"),
            TimeStatus::Elapsed => format!("{body} {PAST_SUFFIX}"),
        }
    }
}

impl Display for DisplayBreakdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sentence())
    }
}

/// Formats the distance between `target_ms` and `now_ms`.
pub fn format_countdown(target_ms: i64, now_ms: i64) -> DisplayBreakdown {
    let decomposition = decompose(target_ms, now_ms);
    let parts = decomposition
        .parts
        .iter()
        .map(|part| DisplayPart {
            unit: part.unit,
            value: part.value,
            label: plural_label(part.value, &unit_forms(part.unit)),
        })
        .collect();

    DisplayBreakdown {
        status: if decomposition.is_future {
            TimeStatus::Upcoming
        } else {
            TimeStatus::Elapsed
        },
        parts,
    }
}

/// Renders the absolute target date for a card, e.g. `1 января 2030 г., 00:00`.
///
/// Instants outside chrono's range fall back to the raw millisecond value.
pub fn format_absolute(date_ms: i64) -> String {
    let Some(date) = DateTime::<Utc>::from_timestamp_millis(date_ms) else {
        return date_ms.to_string();
    };
    let month = MONTHS_GENITIVE[date.month0() as usize];
    format!(
        "{} {month} {} г., {:02}:{:02}",
        date.day(),
        date.year(),
        date.hour(),
        date.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::{format_absolute, format_countdown, TimeStatus};

    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    #[test]
    fn future_sentence_uses_prefix() {
        let breakdown = format_countdown(2 * MINUTE, 0);
        assert_eq!(breakdown.status, TimeStatus::Upcoming);
        assert_eq!(breakdown.sentence(), "Через 2 минуты 0 секунд");
    }

    #[test]
    fn past_sentence_uses_suffix_and_per_unit_plurals() {
        let now = 10 * 365 * DAY;
        let target = now - (3 * DAY + 4 * HOUR + 21 * MINUTE + 11_000);
        assert_eq!(
            format_countdown(target, now).sentence(),
            "3 дня 4 часа 21 минуту 11 секунд назад"
        );
    }

    #[test]
    fn same_instant_reads_as_elapsed_zero() {
        let breakdown = format_countdown(1_000, 1_000);
        assert_eq!(breakdown.status, TimeStatus::Elapsed);
        assert_eq!(breakdown.to_string(), "0 секунд назад");
    }

    #[test]
    fn sentence_is_join_of_structured_parts() {
        let breakdown = format_countdown(400 * DAY + 5_000, 0);
        let joined = breakdown
            .parts
            .iter()
            .map(|part| format!("{} {}", part.value, part.label))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(breakdown.sentence(), format!("Через {joined}"));
        assert_eq!(breakdown.parts[0].label, "год");
    }

    #[test]
    fn absolute_date_uses_genitive_month() {
        assert_eq!(format_absolute(1_893_456_000_000), "1 января 2030 г., 00:00");
        assert_eq!(format_absolute(i64::MAX), i64::MAX.to_string());
    }
}
