use log::warn;
use std::sync::Arc;

use super::{soonest_idle, Roster, Scheduler};
use crate::event::{AssignRequest, Event, EventBus, EventReactor, EventTopic};
use crate::models::{Elevator, Passenger};

/// Picks the elevator whose augmented trajectory becomes idle first.
///
/// Unlike [`GreedyScheduler`](super::GreedyScheduler) it considers every
/// elevator, including one standing on the pickup floor.
#[derive(Default)]
pub struct FlockScheduler {
    roster: Roster,
}

impl FlockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_schedule_request(&self, bus: &dyn EventBus, passenger: &Passenger, floor: i32) {
        let destination = passenger.destination();
        let candidates = self
            .roster
            .trajectories()
            .into_iter()
            .enumerate()
            .map(|(i, t)| (i, t.augment(floor, destination)));

        let Some((assignee, trajectory)) = soonest_idle(candidates) else {
            warn!("No elevators to schedule {} on", passenger);
            return;
        };

        let request = AssignRequest::new(passenger.clone(), floor, assignee)
            .with_timing(trajectory.time_left_on_task(), trajectory.end_time());
        bus.fire_on(EventTopic::Scheduling, Event::AssignRequest(request));
    }
}

impl EventReactor for FlockScheduler {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        if let Event::ScheduleRequest { passenger, floor } = event {
            self.handle_schedule_request(bus, passenger, *floor);
        }
    }
}

impl Scheduler for FlockScheduler {
    fn set_elevators(&self, elevators: Vec<Arc<Elevator>>) {
        self.roster.set(elevators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingBus;
    use crate::models::Trajectory;

    #[test]
    fn test_takes_the_elevator_on_the_pickup_floor() {
        let bus = RecordingBus::default();
        let scheduler = FlockScheduler::new();
        scheduler.set_elevators(vec![
            Arc::new(Elevator::with_trajectory(0, 20, Trajectory::new(0, 9))),
            Arc::new(Elevator::with_trajectory(1, 20, Trajectory::new(0, 4))),
        ]);

        let passenger = Passenger::new(12);
        scheduler.on_event(
            &bus,
            &Event::ScheduleRequest {
                passenger: passenger.clone(),
                floor: 4,
            },
        );

        assert_eq!(
            bus.events(),
            vec![(
                EventTopic::Scheduling,
                Event::AssignRequest(AssignRequest::new(passenger, 4, 1).with_timing(8, 8))
            )]
        );
    }

    #[test]
    fn test_prefers_elevators_heading_home_nearby() {
        let bus = RecordingBus::default();
        let scheduler = FlockScheduler::new();
        scheduler.set_elevators(vec![
            Arc::new(Elevator::with_trajectory(0, 30, Trajectory::homing(0, 0, 10))),
            Arc::new(Elevator::with_trajectory(1, 30, Trajectory::homing(20, 0, 10))),
        ]);

        scheduler.on_event(
            &bus,
            &Event::ScheduleRequest {
                passenger: Passenger::new(18),
                floor: 12,
            },
        );

        let assignee = bus.events().into_iter().find_map(|(_, event)| match event {
            Event::AssignRequest(request) => Some(request.elevator),
            _ => None,
        });
        assert_eq!(assignee, Some(1));
    }
}
