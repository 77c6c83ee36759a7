//! Periodic countdown refresh for displayed events.
//!
//! # Responsibility
//! - Track one display slot per visible event.
//! - Reformat every slot on a fixed cadence and push the result to a sink.
//!
//! # Invariants
//! - Ticks never re-run the collection pipeline; they only read slots.
//! - At most one timer task is alive per scheduler (stop-before-start).
//! - Slot lifecycle: unscheduled → scheduled → updating → unscheduled.
//! - The sink is called with the slot board locked and must not call back
//!   into the scheduler.

use crate::clock::Clock;
use crate::countdown::format::{format_countdown, DisplayBreakdown};
use crate::model::event::{Event, EventId};
use log::{debug, info, trace};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Contracted refresh cadence.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Presentation-side receiver of per-event display updates.
pub trait DisplaySink: Send + Sync {
    /// New countdown text for the slot addressed by `id`.
    fn update(&self, id: &EventId, breakdown: &DisplayBreakdown);
    /// Slot left the visible set; drop its display.
    fn remove(&self, id: &EventId);
}

/// State of a scheduled slot. Absence from the board means unscheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Visible, not refreshed by a tick yet.
    Scheduled,
    /// Refreshed by at least one tick.
    Updating,
}

#[derive(Debug, Clone)]
struct Slot {
    id: EventId,
    date: i64,
    state: SlotState,
}

#[derive(Debug, Default)]
struct SlotBoard {
    slots: Vec<Slot>,
}

/// Outcome of replacing the visible set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotSync {
    pub scheduled: usize,
    pub kept: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start` was called outside a tokio runtime.
    NoRuntime(String),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRuntime(message) => write!(f, "timer needs a tokio runtime: {message}"),
        }
    }
}

impl Error for SchedulerError {}

/// Cancellable periodic refresher.
pub struct TimerScheduler {
    board: Arc<Mutex<SlotBoard>>,
    sink: Arc<dyn DisplaySink>,
    clock: Arc<dyn Clock>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl TimerScheduler {
    pub fn new(sink: Arc<dyn DisplaySink>, clock: Arc<dyn Clock>) -> Self {
        Self::with_period(sink, clock, DEFAULT_TICK)
    }

    /// Finer cadences are allowed; zero is bumped to one millisecond.
    pub fn with_period(
        sink: Arc<dyn DisplaySink>,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        Self {
            board: Arc::new(Mutex::new(SlotBoard::default())),
            sink,
            clock,
            period: period.max(Duration::from_millis(1)),
            task: None,
        }
    }

    /// Replaces the slot set with the newly computed visible list.
    ///
    /// Slots for events that left the list are removed from the sink; slots
    /// that stay keep their state but pick up edited dates.
    pub fn sync_visible(&self, visible: &[Event]) -> SlotSync {
        let mut board = lock_board(&self.board);
        let incoming: HashSet<&EventId> = visible.iter().map(|event| &event.id).collect();

        let mut summary = SlotSync::default();
        for slot in board.slots.iter().filter(|slot| !incoming.contains(&slot.id)) {
            self.sink.remove(&slot.id);
            summary.removed += 1;
        }

        let slots = visible
            .iter()
            .map(|event| {
                let state = board
                    .slots
                    .iter()
                    .find(|slot| slot.id == event.id)
                    .map(|slot| slot.state);
                if state.is_some() {
                    summary.kept += 1;
                } else {
                    summary.scheduled += 1;
                }
                Slot {
                    id: event.id.clone(),
                    date: event.date,
                    state: state.unwrap_or(SlotState::Scheduled),
                }
            })
            .collect();
        board.slots = slots;

        debug!(
            "event=timer_sync module=live status=ok scheduled={} kept={} removed={}",
            summary.scheduled, summary.kept, summary.removed
        );
        summary
    }

    /// Drops one slot, e.g. right after a delete. Unknown ids are ignored.
    pub fn forget(&self, id: &EventId) -> bool {
        let mut board = lock_board(&self.board);
        let before = board.slots.len();
        board.slots.retain(|slot| &slot.id != id);
        let removed = board.slots.len() != before;
        if removed {
            self.sink.remove(id);
        }
        removed
    }

    /// Current slot state; `None` means unscheduled.
    pub fn slot_state(&self, id: &EventId) -> Option<SlotState> {
        lock_board(&self.board)
            .slots
            .iter()
            .find(|slot| &slot.id == id)
            .map(|slot| slot.state)
    }

    pub fn slot_count(&self) -> usize {
        lock_board(&self.board).slots.len()
    }

    /// Runs one refresh at `now_ms` and returns the number of slots updated.
    pub fn tick_at(&self, now_ms: i64) -> usize {
        tick_board(&self.board, self.sink.as_ref(), now_ms)
    }

    /// Runs one refresh at the injected clock's time.
    pub fn tick(&self) -> usize {
        self.tick_at(self.clock.now_ms())
    }

    /// Starts the periodic task, cancelling any previous one first.
    ///
    /// The first refresh happens immediately.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        let handle =
            Handle::try_current().map_err(|err| SchedulerError::NoRuntime(err.to_string()))?;
        self.stop();

        let board = Arc::clone(&self.board);
        let sink = Arc::clone(&self.sink);
        let clock = Arc::clone(&self.clock);
        let period = self.period;
        self.task = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tick_board(&board, sink.as_ref(), clock.now_ms());
            }
        }));

        info!(
            "event=timer_start module=live status=ok period_ms={}",
            period.as_millis()
        );
        Ok(())
    }

    /// Cancels the periodic task. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };
        task.abort();
        info!("event=timer_stop module=live status=ok");
        true
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_board(board: &Mutex<SlotBoard>) -> MutexGuard<'_, SlotBoard> {
    // A panicking sink must not stop later ticks.
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

fn tick_board(board: &Mutex<SlotBoard>, sink: &dyn DisplaySink, now_ms: i64) -> usize {
    let mut board = lock_board(board);
    for slot in &mut board.slots {
        let breakdown = format_countdown(slot.date, now_ms);
        sink.update(&slot.id, &breakdown);
        slot.state = SlotState::Updating;
    }
    trace!(
        "event=timer_tick module=live status=ok slots={}",
        board.slots.len()
    );
    board.slots.len()
}
