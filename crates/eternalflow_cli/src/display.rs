//! Terminal rendering of events and live countdowns.

use eternalflow_core::model::event::EventId;
use eternalflow_core::{format_absolute, format_countdown, DisplayBreakdown, DisplaySink, Event};
use log::warn;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Two-line card: id, status badge and title; then date and countdown.
pub fn render_card(event: &Event, now_ms: i64) -> String {
    let breakdown = format_countdown(event.date, now_ms);
    format!(
        "{}  [{}]  {}\n    {}  |  {}",
        event.id,
        breakdown.status.badge(),
        event.title,
        format_absolute(event.date),
        breakdown.sentence()
    )
}

/// Writes one line per refreshed slot to stdout.
///
/// A failed write is logged once per sink. Later failures are dropped.
#[derive(Debug, Default)]
pub struct TerminalSink {
    write_failed: AtomicBool,
}

impl TerminalSink {
    fn emit(&self, line: fmt::Arguments<'_>) {
        let mut out = io::stdout().lock();
        self.record(writeln!(out, "{line}"));
    }

    /// Returns whether this call logged the failure.
    fn record(&self, result: io::Result<()>) -> bool {
        let Err(err) = result else {
            return false;
        };
        if self.write_failed.swap(true, Ordering::Relaxed) {
            return false;
        }
        warn!("event=display_write module=cli status=error error={err}");
        true
    }
}

impl DisplaySink for TerminalSink {
    fn update(&self, id: &EventId, breakdown: &DisplayBreakdown) {
        self.emit(format_args!("{id}  {breakdown}"));
    }

    fn remove(&self, id: &EventId) {
        self.emit(format_args!("{id}  (hidden)"));
    }
}

#[cfg(test)]
mod tests {
    use super::{render_card, TerminalSink};
    use eternalflow_core::model::event::{Event, EventId};
    use std::io;

    #[test]
    fn card_shows_badge_date_and_countdown() {
        let event = Event {
            id: EventId::parse("e1").unwrap(),
            title: "Новый год".to_string(),
            date: 1_893_456_000_000,
            created_at: None,
        };
        let card = render_card(&event, 1_893_456_000_000 - 90_000);
        assert_eq!(
            card,
            "e1  [Предстоящее]  Новый год\n    1 января 2030 г., 00:00  |  Через 1 минуту 30 секунд"
        );
    }

    #[test]
    fn write_failure_is_reported_once() {
        let sink = TerminalSink::default();
        assert!(!sink.record(Ok(())));
        assert!(sink.record(Err(io::Error::from(io::ErrorKind::BrokenPipe))));
        assert!(!sink.record(Err(io::Error::from(io::ErrorKind::BrokenPipe))));
        assert!(!sink.record(Ok(())));
    }
}
