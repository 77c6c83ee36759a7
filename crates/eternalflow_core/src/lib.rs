//! Core domain logic for EternalFlow countdowns.
//! This crate is the single source of truth for event invariants, countdown
//! formatting and list derivation; it has no UI dependency.

pub mod clock;
pub mod countdown;
pub mod db;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod transfer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::decompose::{decompose, DurationPart, TimeUnit};
pub use countdown::format::{format_absolute, format_countdown, DisplayBreakdown, TimeStatus};
pub use live::scheduler::{DisplaySink, SchedulerError, SlotState, TimerScheduler};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::event::{Event, EventId, ValidationError, MAX_TITLE_CHARS};
pub use model::view::{FilterMode, SortMode, ViewState};
pub use repo::event_repo::{EventRepository, RepoError, RepoResult, SqliteEventRepository};
pub use repo::flat_repo::FlatEventRepository;
pub use search::visible::{compute_visible, EmptyState, VisibleList, VisibleQuery};
pub use service::event_service::{
    EventService, EventServiceError, EventUpdate, ImportReport, ServiceResult,
};
pub use transfer::format::{ExportSnapshot, ImportError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
