use log::warn;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{Roster, Scheduler};
use crate::event::{AssignRequest, Event, EventBus, EventReactor, EventTopic};
use crate::models::{Elevator, Passenger};

/// Hands requests to the elevators in turn, first come first served.
#[derive(Default)]
pub struct RoundRobinScheduler {
    roster: Roster,
    counter: AtomicUsize,
}

impl RoundRobinScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_schedule_request(&self, bus: &dyn EventBus, passenger: &Passenger, floor: i32) {
        let n = self.roster.len();
        if n == 0 {
            warn!("No elevators to schedule {} on", passenger);
            return;
        }

        let assignee = self.counter.fetch_add(1, Ordering::AcqRel) % n;
        bus.fire_on(
            EventTopic::Scheduling,
            Event::AssignRequest(AssignRequest::new(passenger.clone(), floor, assignee)),
        );
    }
}

impl EventReactor for RoundRobinScheduler {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        if let Event::ScheduleRequest { passenger, floor } = event {
            self.handle_schedule_request(bus, passenger, *floor);
        }
    }
}

impl Scheduler for RoundRobinScheduler {
    fn set_elevators(&self, elevators: Vec<Arc<Elevator>>) {
        self.roster.set(elevators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingBus;

    #[test]
    fn test_assigns_in_turn() {
        let bus = RecordingBus::default();
        let scheduler = RoundRobinScheduler::new();
        scheduler.set_elevators((0..3).map(|i| Arc::new(Elevator::new(i, 10))).collect());

        for _ in 0..4 {
            scheduler.on_event(
                &bus,
                &Event::ScheduleRequest {
                    passenger: Passenger::new(5),
                    floor: 1,
                },
            );
        }

        let assignees: Vec<usize> = bus
            .events()
            .into_iter()
            .filter_map(|(topic, event)| match event {
                Event::AssignRequest(request) if topic == EventTopic::Scheduling => {
                    assert!(request.end_time.is_none());
                    Some(request.elevator)
                }
                _ => None,
            })
            .collect();
        assert_eq!(assignees, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_without_elevators_nothing_is_assigned() {
        let bus = RecordingBus::default();
        let scheduler = RoundRobinScheduler::new();
        scheduler.on_event(
            &bus,
            &Event::ScheduleRequest {
                passenger: Passenger::new(5),
                floor: 1,
            },
        );
        assert!(bus.events().is_empty());
    }
}
