//! Filter → search → sort pipeline for event lists.
//!
//! # Responsibility
//! - Derive the ordered visible subset from the full collection.
//! - Classify empty results for presentation.
//!
//! # Invariants
//! - Pipeline order is temporal filter, title search, stable sort.
//! - Sorting never uses `id` as a tiebreak; equal keys keep input order.
//! - `past` includes `date == now`.

use crate::model::event::Event;
use crate::model::view::{FilterMode, SortMode, ViewState};
use crate::search::collate::locale_compare;
use std::cmp::Ordering;

/// Inputs of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct VisibleQuery<'a> {
    pub filter: FilterMode,
    pub search: &'a str,
    pub sort: SortMode,
    pub now_ms: i64,
}

impl<'a> VisibleQuery<'a> {
    pub fn from_view(view: &'a ViewState, now_ms: i64) -> Self {
        Self {
            filter: view.filter,
            search: view.search_query.as_str(),
            sort: view.sort,
            now_ms,
        }
    }
}

/// Why a visible list came out empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The collection itself has no events.
    NoEvents,
    /// A search query is active and nothing matched.
    NoMatches,
    /// Events exist but none fall into the selected bucket.
    NothingInFilter,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleList {
    pub events: Vec<Event>,
    /// `Some` exactly when `events` is empty.
    pub empty_state: Option<EmptyState>,
}

impl VisibleList {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Whether `event` belongs to the temporal bucket.
pub fn matches_filter(event: &Event, filter: FilterMode, now_ms: i64) -> bool {
    match filter {
        FilterMode::All => true,
        FilterMode::Upcoming => event.date > now_ms,
        FilterMode::Past => event.date <= now_ms,
    }
}

/// Case-insensitive substring match on the title only.
fn matches_search(event: &Event, needle_lower: &str) -> bool {
    needle_lower.is_empty() || event.title.to_lowercase().contains(needle_lower)
}

fn compare(left: &Event, right: &Event, sort: SortMode) -> Ordering {
    // Missing createdAt sorts as the earliest instant.
    let added = |event: &Event| event.created_at.unwrap_or(i64::MIN);
    match sort {
        SortMode::DateAsc => left.date.cmp(&right.date),
        SortMode::DateDesc => right.date.cmp(&left.date),
        SortMode::TitleAsc => locale_compare(&left.title, &right.title),
        SortMode::TitleDesc => locale_compare(&right.title, &left.title),
        SortMode::AddedAsc => added(left).cmp(&added(right)),
        SortMode::AddedDesc => added(right).cmp(&added(left)),
    }
}

/// Sorts in place; `sort_by` is stable.
pub fn sort_events(events: &mut [Event], sort: SortMode) {
    events.sort_by(|left, right| compare(left, right, sort));
}

/// Runs the full pipeline and returns the ordered visible events.
pub fn compute_visible(events: &[Event], query: &VisibleQuery<'_>) -> VisibleList {
    let needle = query.search.to_lowercase();

    let mut visible: Vec<Event> = events
        .iter()
        .filter(|event| matches_filter(event, query.filter, query.now_ms))
        .filter(|event| matches_search(event, &needle))
        .cloned()
        .collect();
    sort_events(&mut visible, query.sort);

    let empty_state = if !visible.is_empty() {
        None
    } else if events.is_empty() {
        Some(EmptyState::NoEvents)
    } else if !needle.is_empty() {
        Some(EmptyState::NoMatches)
    } else {
        Some(EmptyState::NothingInFilter)
    };

    VisibleList {
        events: visible,
        empty_state,
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_visible, EmptyState, VisibleQuery};
    use crate::model::event::{Event, EventId};
    use crate::model::view::{FilterMode, SortMode};

    fn event(id: &str, title: &str, date: i64) -> Event {
        Event {
            id: EventId::parse(id).unwrap(),
            title: title.to_string(),
            date,
            created_at: None,
        }
    }

    fn query(filter: FilterMode, search: &str, sort: SortMode) -> VisibleQuery<'_> {
        VisibleQuery {
            filter,
            search,
            sort,
            now_ms: 100,
        }
    }

    #[test]
    fn search_is_case_insensitive_for_cyrillic() {
        let events = vec![event("1", "День Рождения", 10), event("2", "Отпуск", 20)];
        let visible = compute_visible(&events, &query(FilterMode::All, "рожд", SortMode::DateAsc));
        assert_eq!(visible.events.len(), 1);
        assert_eq!(visible.events[0].id.as_str(), "1");
    }

    #[test]
    fn search_whitespace_is_part_of_the_needle() {
        let events = vec![event("1", "xyz", 10), event("2", "New year", 20)];

        let leading = compute_visible(&events, &query(FilterMode::All, " x", SortMode::DateAsc));
        assert!(leading.is_empty());
        assert_eq!(leading.empty_state, Some(EmptyState::NoMatches));

        let blank = compute_visible(&events, &query(FilterMode::All, "   ", SortMode::DateAsc));
        assert!(blank.is_empty());

        let spaced = compute_visible(&events, &query(FilterMode::All, " ", SortMode::DateAsc));
        assert_eq!(spaced.len(), 1);
        assert_eq!(spaced.events[0].id.as_str(), "2");
    }

    #[test]
    fn empty_state_is_classified() {
        let none = compute_visible(&[], &query(FilterMode::All, "", SortMode::DateAsc));
        assert_eq!(none.empty_state, Some(EmptyState::NoEvents));

        let events = vec![event("1", "Exam", 10)];
        let no_match = compute_visible(&events, &query(FilterMode::All, "zzz", SortMode::DateAsc));
        assert_eq!(no_match.empty_state, Some(EmptyState::NoMatches));

        let bucket = compute_visible(&events, &query(FilterMode::Upcoming, "", SortMode::DateAsc));
        assert_eq!(bucket.empty_state, Some(EmptyState::NothingInFilter));

        let some = compute_visible(&events, &query(FilterMode::Past, "", SortMode::DateAsc));
        assert_eq!(some.empty_state, None);
    }

    #[test]
    fn boundary_instant_is_past() {
        let events = vec![event("1", "now", 100)];
        assert_eq!(
            compute_visible(&events, &query(FilterMode::Past, "", SortMode::DateAsc)).len(),
            1
        );
        assert!(
            compute_visible(&events, &query(FilterMode::Upcoming, "", SortMode::DateAsc))
                .is_empty()
        );
    }
}
