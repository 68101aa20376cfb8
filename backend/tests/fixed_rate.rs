//! Real-time runs of the fixed-rate simulator.

use liftsim::{
    Event, EventBus, FixedRateSimulator, PartitionedEventBus, RunnableEventBus, SimulationConfig,
    SynchronizedEventBus,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn tick_recorder(bus: &dyn EventBus) -> Arc<Mutex<Vec<i64>>> {
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let sink = ticks.clone();
    bus.attach(Arc::new(move |_: &dyn EventBus, event: &Event| {
        if let Event::ClockTick { value } = event {
            sink.lock().unwrap().push(*value);
        }
    }));
    ticks
}

fn run_for(bus: Arc<dyn RunnableEventBus>, rate: Duration, wall: Duration) -> i64 {
    let simulator = Arc::new(FixedRateSimulator::new(bus, rate));
    let runner = {
        let simulator = simulator.clone();
        thread::spawn(move || simulator.start())
    };

    thread::sleep(wall);
    simulator.shutdown();
    runner.join().unwrap().unwrap();

    assert!(simulator.is_shut_down());
    simulator.clock()
}

#[test]
fn test_ticks_on_synchronized_bus() {
    let bus = Arc::new(SynchronizedEventBus::new());
    let ticks = tick_recorder(bus.as_ref());

    let clock = run_for(bus, Duration::from_millis(5), Duration::from_millis(400));

    let ticks = ticks.lock().unwrap();
    assert!(clock > 0);
    assert_eq!(ticks.first(), Some(&1));
    assert!(ticks.windows(2).all(|w| w[1] == w[0] + 1));
    assert!(*ticks.last().unwrap() <= clock);
}

#[test]
fn test_ticks_on_partitioned_bus() {
    let bus = Arc::new(PartitionedEventBus::default());
    let ticks = tick_recorder(bus.as_ref());

    let clock = run_for(bus, Duration::from_millis(5), Duration::from_millis(400));

    assert!(clock > 0);
    assert!(!ticks.lock().unwrap().is_empty());
}

#[test]
fn test_no_tick_before_initial_delay() {
    let bus = Arc::new(SynchronizedEventBus::new());
    let clock = run_for(bus, Duration::from_millis(5), Duration::from_millis(10));
    assert_eq!(clock, 0);
}

#[test]
fn test_live_building_serves_a_request() {
    let config = SimulationConfig {
        floors: 6,
        elevators: 2,
        tick_ms: 5,
        ..Default::default()
    };
    let building = Arc::new(config.building_builder().build().unwrap());
    let simulator = Arc::new(FixedRateSimulator::new(
        building.bus().clone(),
        config.tick_rate(),
    ));
    let runner = {
        let simulator = simulator.clone();
        thread::spawn(move || simulator.start())
    };

    building.request(1, 4).unwrap();

    // Generous wall-clock budget: the trip needs about ten ticks
    let mut delivered = false;
    for _ in 0..200 {
        thread::sleep(Duration::from_millis(10));
        let snapshot = building.snapshot();
        if snapshot.clock > 20
            && snapshot.elevators.iter().all(|e| e.idle && e.passengers == 0)
            && snapshot.floors.iter().all(|f| f.waiting == 0)
        {
            delivered = true;
            break;
        }
    }

    simulator.shutdown();
    runner.join().unwrap().unwrap();
    assert!(delivered, "{:?}", building.snapshot());
}
