use eternalflow_core::model::event::{Event, EventId};
use eternalflow_core::{
    DisplayBreakdown, DisplaySink, EventService, FlatEventRepository, ManualClock,
    SchedulerError, SlotState, TimerScheduler,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const NOW: i64 = 1_704_067_200_000;

#[derive(Default)]
struct RecordingSink {
    updates: Mutex<Vec<(EventId, String)>>,
    removals: Mutex<Vec<EventId>>,
}

impl RecordingSink {
    fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    fn last_text(&self) -> Option<String> {
        self.updates
            .lock()
            .unwrap()
            .last()
            .map(|(_, text)| text.clone())
    }

    fn removed(&self) -> Vec<EventId> {
        self.removals.lock().unwrap().clone()
    }
}

impl DisplaySink for RecordingSink {
    fn update(&self, id: &EventId, breakdown: &DisplayBreakdown) {
        self.updates
            .lock()
            .unwrap()
            .push((id.clone(), breakdown.sentence()));
    }

    fn remove(&self, id: &EventId) {
        self.removals.lock().unwrap().push(id.clone());
    }
}

fn event(id: &str, date: i64) -> Event {
    Event {
        id: EventId::parse(id).unwrap(),
        title: format!("Событие {id}"),
        date,
        created_at: Some(0),
    }
}

fn scheduler() -> (TimerScheduler, Arc<RecordingSink>, Arc<ManualClock>) {
    let sink = Arc::new(RecordingSink::default());
    let clock = Arc::new(ManualClock::new(NOW));
    let scheduler = TimerScheduler::new(sink.clone(), clock.clone());
    (scheduler, sink, clock)
}

#[test]
fn slots_move_from_scheduled_to_updating_to_unscheduled() {
    let (scheduler, sink, _clock) = scheduler();
    let a = event("a", NOW + 90_000);
    let b = event("b", NOW - 5_000);

    let sync = scheduler.sync_visible(&[a.clone(), b.clone()]);
    assert_eq!((sync.scheduled, sync.kept, sync.removed), (2, 0, 0));
    assert_eq!(scheduler.slot_state(&a.id), Some(SlotState::Scheduled));

    assert_eq!(scheduler.tick_at(NOW), 2);
    assert_eq!(scheduler.slot_state(&a.id), Some(SlotState::Updating));
    assert_eq!(scheduler.slot_state(&b.id), Some(SlotState::Updating));

    let sync = scheduler.sync_visible(&[a.clone()]);
    assert_eq!((sync.scheduled, sync.kept, sync.removed), (0, 1, 1));
    assert_eq!(scheduler.slot_state(&a.id), Some(SlotState::Updating));
    assert_eq!(scheduler.slot_state(&b.id), None);
    assert_eq!(sink.removed(), vec![b.id]);
}

#[test]
fn tick_formats_against_the_given_instant() {
    let (scheduler, sink, clock) = scheduler();
    scheduler.sync_visible(&[event("a", NOW + 90_000)]);

    scheduler.tick();
    assert_eq!(sink.last_text().as_deref(), Some("Через 1 минуту 30 секунд"));

    clock.advance(91_000);
    scheduler.tick();
    assert_eq!(sink.last_text().as_deref(), Some("1 секунду назад"));
}

#[test]
fn forget_drops_one_slot() {
    let (scheduler, sink, _clock) = scheduler();
    let a = event("a", NOW);
    scheduler.sync_visible(&[a.clone()]);

    assert!(scheduler.forget(&a.id));
    assert!(!scheduler.forget(&a.id));
    assert_eq!(scheduler.slot_count(), 0);
    assert_eq!(scheduler.tick_at(NOW), 0);
    assert_eq!(sink.removed(), vec![a.id]);
}

#[test]
fn start_outside_runtime_fails() {
    let (mut scheduler, _sink, _clock) = scheduler();
    let err = scheduler.start().unwrap_err();
    assert!(matches!(err, SchedulerError::NoRuntime(_)));
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn ticks_once_per_second_starting_immediately() {
    let (mut scheduler, sink, _clock) = scheduler();
    scheduler.sync_visible(&[event("a", NOW + 10_000)]);

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(sink.update_count(), 4);
    assert!(scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn restarting_does_not_duplicate_ticks() {
    let (mut scheduler, sink, _clock) = scheduler();
    scheduler.sync_visible(&[event("a", NOW + 10_000)]);

    scheduler.start().unwrap();
    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    assert_eq!(sink.update_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_halts_updates() {
    let (mut scheduler, sink, _clock) = scheduler();
    scheduler.sync_visible(&[event("a", NOW + 10_000)]);

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(scheduler.stop());
    let seen = sink.update_count();

    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(seen, 2);
    assert_eq!(sink.update_count(), seen);
    assert!(!scheduler.stop());
}

#[tokio::test(start_paused = true)]
async fn service_feeds_visible_events_to_the_display() {
    let sink = Arc::new(RecordingSink::default());
    let mut service = EventService::open(
        FlatEventRepository::in_memory(),
        Arc::new(ManualClock::new(NOW)),
    )
    .unwrap();
    service.attach_display(sink.clone());
    let shown = service.create_event("Показ", "2030-01-01").unwrap();
    let hidden = service.create_event("Скрыт", "2020-01-01").unwrap();
    service.set_search("показ");

    assert!(service.start_timers().unwrap());
    tokio::time::sleep(Duration::from_millis(500)).await;

    let scheduler = service.scheduler().unwrap();
    assert_eq!(scheduler.slot_state(&shown.id), Some(SlotState::Updating));
    assert_eq!(scheduler.slot_state(&hidden.id), None);
    assert_eq!(sink.update_count(), 1);
    assert_eq!(sink.removed(), vec![hidden.id]);
    assert!(service.stop_timers());
}
