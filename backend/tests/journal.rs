//! Journal written during a run, then replayed.

use liftsim::{
    monitor, Event, EventBus, JournalReader, JournalWriter, OfflineSimulator, RunnableEventBus,
    SchedulerKind, SimulationConfig, SynchronizedEventBus,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

fn recorder(bus: &dyn EventBus) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    bus.attach(Arc::new(move |_: &dyn EventBus, event: &Event| {
        sink.lock().unwrap().push(event.clone());
    }));
    events
}

#[test]
fn test_replay_matches_live_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");

    let live_bus = Arc::new(SynchronizedEventBus::new());
    let live = recorder(live_bus.as_ref());
    let writer = Arc::new(JournalWriter::create(&path).unwrap());

    let config = SimulationConfig {
        floors: 12,
        elevators: 2,
        scheduler: SchedulerKind::Greedy,
        ..Default::default()
    };
    let building = config
        .building_builder()
        .event_bus(live_bus.clone())
        .reactor(writer.clone())
        .build()
        .unwrap();
    building.request_at(2, 0, 11).unwrap();
    building.request_at(4, 8, 3).unwrap();
    OfflineSimulator::new(building.bus().clone()).run_to(30);

    let live = live.lock().unwrap().clone();
    assert_eq!(writer.written(), live.len() as u64);

    // Same events, same order
    let replay_bus = SynchronizedEventBus::new();
    let replayed = recorder(&replay_bus);
    let mut reader = JournalReader::open(&path).unwrap();
    assert_eq!(reader.replay(&replay_bus).unwrap(), live.len());
    replay_bus.process();
    assert_eq!(*replayed.lock().unwrap(), live);
    assert_eq!(reader.line(), live.len());

    // And the monitor gets through all of it
    let count = monitor(&path, false, &AtomicBool::new(false)).unwrap();
    assert_eq!(count, live.len());
}

#[test]
fn test_monitor_rejects_missing_journal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(monitor(dir.path().join("nope.jsonl"), false, &AtomicBool::new(false)).is_err());
}
