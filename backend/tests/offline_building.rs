//! Whole-building runs on the offline simulator.

use liftsim::{
    BusKind, Event, EventBus, OfflineSimulator, SchedulerKind, SimulationConfig, TripCounter,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Events seen by a reactor on every topic, stamped with the last tick.
#[derive(Default)]
struct Timeline {
    clock: i64,
    events: Vec<(i64, Event)>,
}

fn record(timeline: &Arc<Mutex<Timeline>>) -> Arc<dyn liftsim::EventReactor> {
    let sink = timeline.clone();
    Arc::new(move |_: &dyn EventBus, event: &Event| {
        let mut timeline = sink.lock().unwrap();
        if let Event::ClockTick { value } = event {
            timeline.clock = *value;
        }
        let clock = timeline.clock;
        timeline.events.push((clock, event.clone()));
    })
}

fn homing_config(bus: BusKind) -> SimulationConfig {
    SimulationConfig {
        floors: 30,
        elevators: 5,
        home_floors: Some(vec![5, 10, 15, 20, 25]),
        scheduler: SchedulerKind::RoundRobin,
        bus,
        ..Default::default()
    }
}

fn assert_single_trip(bus: BusKind) {
    let timeline = Arc::new(Mutex::new(Timeline::default()));
    let building = homing_config(bus)
        .building_builder()
        .reactor(record(&timeline))
        .build()
        .unwrap();

    let passenger = building.request_at(20, 3, 10).unwrap();
    let simulator = OfflineSimulator::new(building.bus().clone());
    simulator.run_to(40);

    let timeline = timeline.lock().unwrap();
    let trip: Vec<(i64, &Event)> = timeline
        .events
        .iter()
        .filter(|(_, e)| {
            matches!(
                e,
                Event::LoadPassenger { .. } | Event::DropPassenger { .. }
            )
        })
        .map(|(t, e)| (*t, e))
        .collect();

    assert_eq!(
        trip,
        vec![
            (
                22,
                &Event::LoadPassenger {
                    floor: 3,
                    elevator: 0,
                    passenger: passenger.clone(),
                }
            ),
            (
                29,
                &Event::DropPassenger {
                    floor: 10,
                    elevator: 0,
                    passenger,
                }
            ),
        ]
    );

    // Back home and nobody left behind
    let snapshot = building.snapshot();
    assert_eq!(snapshot.clock, 40);
    assert_eq!(snapshot.elevators[0].floor, 5);
    assert!(snapshot.elevators.iter().all(|e| e.idle && e.passengers == 0));
    assert!(snapshot.floors.iter().all(|f| f.waiting == 0));
    assert_eq!(snapshot.backlog, Some(0));
}

#[test]
fn test_homing_trip_on_synchronized_bus() {
    assert_single_trip(BusKind::Synchronized);
}

#[test]
fn test_homing_trip_on_partitioned_bus() {
    assert_single_trip(BusKind::Partitioned);
}

#[test]
fn test_idle_elevators_stay_home() {
    let building = homing_config(BusKind::Synchronized)
        .building_builder()
        .build()
        .unwrap();
    OfflineSimulator::new(building.bus().clone()).run_to(10);

    let floors: Vec<i32> = building.elevators().iter().map(|e| e.current_floor()).collect();
    assert_eq!(floors, vec![5, 10, 15, 20, 25]);
}

fn deliver_all(scheduler: SchedulerKind, bus: BusKind) {
    let config = SimulationConfig {
        floors: 10,
        elevators: 3,
        scheduler,
        bus,
        ..Default::default()
    };
    let counter = Arc::new(TripCounter::new());
    let building = config
        .building_builder()
        .reactor(counter.clone())
        .build()
        .unwrap();

    for (at, origin, destination) in [(5, 2, 8), (6, 7, 1), (6, 4, 9), (12, 9, 0)] {
        building.request_at(at, origin, destination).unwrap();
    }
    OfflineSimulator::new(building.bus().clone()).run_to(80);

    let summary = counter.summary();
    assert_eq!(summary.clock, 80);
    assert_eq!(summary.delivered, 4, "{:?} on {:?}: {:?}", scheduler, bus, summary);
    assert_eq!(summary.loaded, 4);
    assert!(summary.requested >= 4);
    assert_eq!(summary.accepted, summary.requested - summary.rejected);

    let snapshot = building.snapshot();
    assert!(snapshot.elevators.iter().all(|e| e.passengers == 0));
    assert!(snapshot.floors.iter().all(|f| f.waiting == 0));
}

#[test]
fn test_every_scheduler_delivers() {
    for scheduler in [
        SchedulerKind::RoundRobin,
        SchedulerKind::Greedy,
        SchedulerKind::Flock,
    ] {
        for bus in [BusKind::Synchronized, BusKind::Partitioned] {
            deliver_all(scheduler, bus);
        }
    }
}

#[test]
fn test_requests_in_the_past_are_refused() {
    let building = homing_config(BusKind::Synchronized)
        .building_builder()
        .build()
        .unwrap();
    OfflineSimulator::new(building.bus().clone()).run_to(10);

    assert!(building.request_at(3, 1, 2).is_err());
    assert!(building.request_at(10, 1, 2).is_ok());
}

#[test]
fn test_burst_beyond_queue_depth_runs_without_delay() {
    let config = SimulationConfig {
        floors: 10,
        elevators: 2,
        scheduler: SchedulerKind::RoundRobin,
        bus: BusKind::Partitioned,
        queue_depth: 4,
        ..Default::default()
    };
    let counter = Arc::new(TripCounter::new());
    let building = config
        .building_builder()
        .reactor(counter.clone())
        .build()
        .unwrap();
    for _ in 0..8 {
        building.request_at(1, 1, 5).unwrap();
    }

    let simulator = OfflineSimulator::new(building.bus().clone());
    let started = Instant::now();
    simulator.run_to(1);
    assert!(started.elapsed() < Duration::from_secs(1), "{:?}", started.elapsed());
    assert_eq!(counter.summary().requested, 8);

    simulator.run_to(30);
    assert_eq!(counter.summary().delivered, 8);
    assert_eq!(building.snapshot().backlog, Some(0));
}
