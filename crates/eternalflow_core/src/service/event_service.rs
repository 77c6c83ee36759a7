//! Event use-case controller.
//!
//! # Responsibility
//! - Own the application state: repository, mirrored collection, view state,
//!   visible list and the live timer.
//! - Validate input at the write boundary and map lower-level failures to the
//!   four user-facing kinds (validation, storage, not found, import format).
//!
//! # Invariants
//! - `events` mirrors the last successful load/write; a failed store call
//!   leaves it untouched.
//! - The visible list is recomputed only when the collection or the view
//!   state changes, never per timer tick.
//! - Every user operation takes `&mut self` and runs to completion.

use crate::clock::Clock;
use crate::live::scheduler::{DisplaySink, SchedulerError, TimerScheduler};
use crate::model::event::{
    parse_instant, validate_title, Event, EventId, EventPatch, ValidationError,
};
use crate::model::view::{FilterMode, SortMode, ViewState};
use crate::repo::event_repo::{EventRepository, RepoError};
use crate::search::visible::{compute_visible, VisibleList, VisibleQuery};
use crate::transfer::format::{build_export, parse_import, ExportSnapshot, ImportError};
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub const FILTER_SETTING: &str = "filter";
pub const SORT_SETTING: &str = "sort";
pub const APP_VERSION_SETTING: &str = "app_version";

/// User-facing failure of an event operation.
#[derive(Debug)]
pub enum EventServiceError {
    /// Rejected form input; nothing reached storage.
    Validation(ValidationError),
    /// Store adapter failure; in-memory state unchanged.
    Storage(RepoError),
    /// Update or edit referencing a vanished id.
    NotFound(EventId),
    /// Import document unusable; nothing was written.
    ImportFormat(ImportError),
}

impl Display for EventServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid {}: {err}", err.field()),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::ImportFormat(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EventServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) => None,
            Self::ImportFormat(err) => Some(err),
        }
    }
}

impl From<ValidationError> for EventServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ImportError> for EventServiceError {
    fn from(value: ImportError) -> Self {
        Self::ImportFormat(value)
    }
}

impl From<RepoError> for EventServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, EventServiceError>;

/// Counts reported by a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records written to the store.
    pub imported: usize,
    /// Records rejected by validation.
    pub dropped: usize,
    /// Valid records the store refused.
    pub failed: usize,
}

/// Field replacements for an update. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventUpdate<'a> {
    pub title: Option<&'a str>,
    pub date: Option<&'a str>,
}

/// Application controller over one repository.
pub struct EventService<R: EventRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
    events: Vec<Event>,
    view: ViewState,
    visible: VisibleList,
    scheduler: Option<TimerScheduler>,
}

impl<R: EventRepository> EventService<R> {
    /// Loads persisted preferences and the full collection.
    ///
    /// Missing or unreadable preferences fall back to `all` / `date-asc`.
    pub fn open(repo: R, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        let started_at = Instant::now();
        let view = ViewState {
            filter: read_mode_setting(&repo, FILTER_SETTING),
            sort: read_mode_setting(&repo, SORT_SETTING),
            ..ViewState::default()
        };

        let events = repo.load_all().map_err(|err| {
            error!(
                "event=service_open module=service status=error error_code=load_failed error={err}"
            );
            EventServiceError::from(err)
        })?;

        let mut service = Self {
            repo,
            clock,
            events,
            view,
            visible: VisibleList {
                events: Vec::new(),
                empty_state: None,
            },
            scheduler: None,
        };
        service.refresh_visible();

        info!(
            "event=service_open module=service status=ok events={} filter={} sort={} duration_ms={}",
            service.events.len(),
            service.view.filter,
            service.view.sort,
            started_at.elapsed().as_millis()
        );
        Ok(service)
    }

    /// Attaches a display sink and the live timer feeding it.
    pub fn attach_display(&mut self, sink: Arc<dyn DisplaySink>) {
        let scheduler = TimerScheduler::new(sink, Arc::clone(&self.clock));
        scheduler.sync_visible(&self.visible.events);
        if let Some(mut previous) = self.scheduler.replace(scheduler) {
            previous.stop();
        }
    }

    /// Full collection in store order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Last computed visible list.
    pub fn visible(&self) -> &VisibleList {
        &self.visible
    }

    pub fn scheduler(&self) -> Option<&TimerScheduler> {
        self.scheduler.as_ref()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Re-runs filter → search → sort and resyncs timer slots.
    pub fn refresh_visible(&mut self) -> &VisibleList {
        let query = VisibleQuery::from_view(&self.view, self.clock.now_ms());
        self.visible = compute_visible(&self.events, &query);
        if let Some(scheduler) = &self.scheduler {
            scheduler.sync_visible(&self.visible.events);
        }
        &self.visible
    }

    /// Replaces the mirror with a fresh store read.
    pub fn reload(&mut self) -> ServiceResult<&VisibleList> {
        match self.repo.load_all() {
            Ok(events) => {
                self.events = events;
                Ok(self.refresh_visible())
            }
            Err(err) => {
                error!(
                    "event=event_reload module=service status=error error_code=load_failed error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Validates and stores a new event.
    pub fn create_event(&mut self, title: &str, date: &str) -> ServiceResult<Event> {
        let title = validate_title(title)?;
        let date = parse_instant(date)?;
        let event = Event::new(title, date, self.clock.now_ms());

        if let Err(err) = self.repo.insert_event(&event) {
            error!(
                "event=event_create module=service status=error error_code=store_failed error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=event_create module=service status=ok event_id={}",
            event.id
        );
        self.events.push(event.clone());
        self.refresh_visible();
        Ok(event)
    }

    /// Replaces title and/or date; id and creation time are preserved.
    ///
    /// Clears the edit session when it targeted this event.
    pub fn update_event(&mut self, id: &EventId, update: EventUpdate<'_>) -> ServiceResult<Event> {
        let patch = EventPatch {
            title: update.title.map(validate_title).transpose()?,
            date: update.date.map(parse_instant).transpose()?,
        };
        if patch.is_empty() {
            return self
                .find_event(id)
                .cloned()
                .ok_or_else(|| EventServiceError::NotFound(id.clone()));
        }

        let updated = match self.repo.update_event(id, &patch) {
            Ok(updated) => updated,
            Err(err) => {
                let level = if matches!(err, RepoError::NotFound(_)) {
                    log::Level::Warn
                } else {
                    log::Level::Error
                };
                log::log!(
                    level,
                    "event=event_update module=service status=error event_id={id} error={err}"
                );
                return Err(err.into());
            }
        };

        if let Some(slot) = self.events.iter_mut().find(|event| &event.id == id) {
            *slot = updated.clone();
        }
        if self.view.editing_id.as_ref() == Some(id) {
            self.view.editing_id = None;
        }
        info!("event=event_update module=service status=ok event_id={id}");
        self.refresh_visible();
        Ok(updated)
    }

    /// Deletes one event. Returns whether it existed; absent ids are a no-op.
    pub fn delete_event(&mut self, id: &EventId) -> ServiceResult<bool> {
        if let Err(err) = self.repo.delete_event(id) {
            error!("event=event_delete module=service status=error event_id={id} error={err}");
            return Err(err.into());
        }

        let before = self.events.len();
        self.events.retain(|event| &event.id != id);
        let existed = self.events.len() != before;
        if self.view.editing_id.as_ref() == Some(id) {
            self.view.editing_id = None;
        }
        if let Some(scheduler) = &self.scheduler {
            scheduler.forget(id);
        }

        info!(
            "event=event_delete module=service status={} event_id={id}",
            if existed { "ok" } else { "skip" }
        );
        self.refresh_visible();
        Ok(existed)
    }

    /// Removes every event. Returns how many were held.
    pub fn clear_all(&mut self) -> ServiceResult<usize> {
        if let Err(err) = self.repo.clear_events() {
            error!("event=event_clear module=service status=error error={err}");
            return Err(err.into());
        }
        let removed = self.events.len();
        self.events.clear();
        self.view.editing_id = None;
        info!("event=event_clear module=service status=ok removed={removed}");
        self.refresh_visible();
        Ok(removed)
    }

    pub fn find_event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    /// Opens an edit session for `id`, replacing any previous one.
    pub fn begin_edit(&mut self, id: &EventId) -> ServiceResult<&Event> {
        let index = self
            .events
            .iter()
            .position(|event| &event.id == id)
            .ok_or_else(|| EventServiceError::NotFound(id.clone()))?;
        self.view.editing_id = Some(id.clone());
        Ok(&self.events[index])
    }

    pub fn cancel_edit(&mut self) {
        self.view.editing_id = None;
    }

    /// Event under edit, if the session still points at a live record.
    pub fn editing(&self) -> Option<&Event> {
        self.view
            .editing_id
            .as_ref()
            .and_then(|id| self.find_event(id))
    }

    pub fn set_filter(&mut self, filter: FilterMode) -> &VisibleList {
        self.view.filter = filter;
        self.persist_setting(FILTER_SETTING, filter.as_str());
        self.refresh_visible()
    }

    pub fn set_sort(&mut self, sort: SortMode) -> &VisibleList {
        self.view.sort = sort;
        self.persist_setting(SORT_SETTING, sort.as_str());
        self.refresh_visible()
    }

    pub fn set_search(&mut self, query: impl Into<String>) -> &VisibleList {
        self.view.search_query = query.into();
        self.refresh_visible()
    }

    pub fn clear_search(&mut self) -> &VisibleList {
        self.set_search(String::new())
    }

    /// Imports a JSON document record by record.
    ///
    /// Partial storage failure is tolerated and counted; a document with no
    /// valid record fails as a whole before anything is written. Stored
    /// records join the mirror one by one, so the report always reaches the
    /// caller once writing has started.
    pub fn import_json(&mut self, raw: &str) -> ServiceResult<ImportReport> {
        let batch = parse_import(raw).map_err(|err| {
            warn!("event=event_import module=service status=error error_code=format error={err}");
            EventServiceError::from(err)
        })?;

        let now = self.clock.now_ms();
        let mut taken: HashSet<EventId> = self.events.iter().map(|e| e.id.clone()).collect();
        let mut report = ImportReport {
            dropped: batch.dropped,
            ..ImportReport::default()
        };

        for candidate in batch.candidates {
            // Imported ids are kept unless they clash with a live one.
            let id = candidate
                .id
                .filter(|id| !taken.contains(id))
                .unwrap_or_else(EventId::generate);
            let event = Event {
                id,
                title: candidate.title,
                date: candidate.date,
                created_at: Some(candidate.created_at.unwrap_or(now)),
            };
            match self.repo.insert_event(&event) {
                Ok(()) => {
                    taken.insert(event.id.clone());
                    self.events.push(event);
                    report.imported += 1;
                }
                Err(err) => {
                    warn!(
                        "event=event_import_record module=service status=error event_id={} error={err}",
                        event.id
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            "event=event_import module=service status=ok imported={} dropped={} failed={}",
            report.imported, report.dropped, report.failed
        );
        self.refresh_visible();
        Ok(report)
    }

    /// Snapshot of every held event for export.
    pub fn export(&self) -> ExportSnapshot {
        build_export(&self.events, self.clock.now_ms())
    }

    /// Returns `true` once after the stored app version changes.
    pub fn check_new_version(&mut self) -> bool {
        let current = env!("CARGO_PKG_VERSION");
        let stored = match self.repo.get_setting(APP_VERSION_SETTING) {
            Ok(value) => value,
            Err(err) => {
                warn!("event=version_check module=service status=error error={err}");
                return false;
            }
        };
        if stored.as_deref() == Some(current) {
            return false;
        }
        self.persist_setting(APP_VERSION_SETTING, current);
        true
    }

    /// Starts (or restarts) the live timer. No-op without a display.
    pub fn start_timers(&mut self) -> Result<bool, SchedulerError> {
        match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.start().map(|()| true),
            None => Ok(false),
        }
    }

    pub fn stop_timers(&mut self) -> bool {
        self.scheduler
            .as_mut()
            .is_some_and(TimerScheduler::stop)
    }

    fn persist_setting(&mut self, name: &str, value: &str) {
        if let Err(err) = self.repo.put_setting(name, value) {
            warn!("event=setting_put module=service status=error name={name} error={err}");
        }
    }
}

fn read_mode_setting<R, M>(repo: &R, name: &str) -> M
where
    R: EventRepository,
    M: std::str::FromStr + Default,
    M::Err: Display,
{
    match repo.get_setting(name) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
            warn!("event=setting_read module=service status=skip name={name} error={err}");
            M::default()
        }),
        Ok(None) => M::default(),
        Err(err) => {
            warn!("event=setting_read module=service status=error name={name} error={err}");
            M::default()
        }
    }
}
