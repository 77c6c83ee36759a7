//! Ephemeral view state for event lists.
//!
//! # Responsibility
//! - Name the filter/sort modes understood by the collection view.
//! - Provide stable string forms used by settings persistence and the CLI.
//!
//! # Invariants
//! - Defaults are `all` / `date-asc`.
//! - At most one event is being edited at a time.

use crate::model::event::EventId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Temporal bucket filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    #[default]
    All,
    /// `date > now`
    Upcoming,
    /// `date <= now`
    Past,
}

impl FilterMode {
    pub const ALL: [Self; 3] = [Self::All, Self::Upcoming, Self::Past];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Upcoming => "upcoming",
            Self::Past => "past",
        }
    }
}

/// Ordering applied after filtering and search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortMode {
    #[default]
    DateAsc,
    DateDesc,
    TitleAsc,
    TitleDesc,
    AddedAsc,
    AddedDesc,
}

impl SortMode {
    pub const ALL: [Self; 6] = [
        Self::DateAsc,
        Self::DateDesc,
        Self::TitleAsc,
        Self::TitleDesc,
        Self::AddedAsc,
        Self::AddedDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateAsc => "date-asc",
            Self::DateDesc => "date-desc",
            Self::TitleAsc => "title-asc",
            Self::TitleDesc => "title-desc",
            Self::AddedAsc => "added-asc",
            Self::AddedDesc => "added-desc",
        }
    }
}

/// Unknown filter/sort token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModeError {
    pub kind: &'static str,
    pub value: String,
}

impl Display for UnknownModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} mode `{}`", self.kind, self.value)
    }
}

impl Error for UnknownModeError {}

impl FromStr for FilterMode {
    type Err = UnknownModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| UnknownModeError {
                kind: "filter",
                value: value.to_string(),
            })
    }
}

impl FromStr for SortMode {
    type Err = UnknownModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| UnknownModeError {
                kind: "sort",
                value: value.to_string(),
            })
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for SortMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current list presentation state owned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: FilterMode,
    pub sort: SortMode,
    pub search_query: String,
    pub editing_id: Option<EventId>,
}

impl ViewState {
    /// Whether a search query is active. Whitespace counts as a query.
    pub fn is_searching(&self) -> bool {
        !self.search_query.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterMode, SortMode, ViewState};

    #[test]
    fn modes_parse_from_their_string_forms() {
        for mode in FilterMode::ALL {
            assert_eq!(mode.as_str().parse::<FilterMode>().unwrap(), mode);
        }
        for mode in SortMode::ALL {
            assert_eq!(mode.as_str().parse::<SortMode>().unwrap(), mode);
        }
        assert_eq!(" Title-Desc ".parse::<SortMode>().unwrap(), SortMode::TitleDesc);
    }

    #[test]
    fn unknown_mode_reports_kind() {
        let err = "newest".parse::<SortMode>().unwrap_err();
        assert_eq!(err.kind, "sort");
        assert!(err.to_string().contains("newest"));
    }

    #[test]
    fn whitespace_only_query_is_an_active_search() {
        let mut view = ViewState::default();
        assert!(!view.is_searching());
        view.search_query = "  ".to_string();
        assert!(view.is_searching());
    }
}
