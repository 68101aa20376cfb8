use log::warn;
use std::sync::Arc;

use super::{soonest_idle, Roster, Scheduler};
use crate::event::{AssignRequest, Event, EventBus, EventReactor, EventTopic};
use crate::models::{Elevator, Passenger};

/// Greedily minimizes the time until the chosen elevator becomes idle.
///
/// Works with homing elevators as well as elevators that stay at their last
/// stop. Elevators sitting on the pickup floor are skipped, since they may
/// leave it before the assignment lands; if all of them do, the request goes
/// to the best of them anyway.
#[derive(Default)]
pub struct GreedyScheduler {
    roster: Roster,
}

impl GreedyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_schedule_request(&self, bus: &dyn EventBus, passenger: &Passenger, floor: i32) {
        let destination = passenger.destination();
        let trajectories = self.roster.trajectories();

        let best = soonest_idle(
            trajectories
                .iter()
                .enumerate()
                .filter_map(|(i, t)| t.augment_opt(floor, destination).map(|t| (i, t))),
        )
        .or_else(|| {
            soonest_idle(
                trajectories
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (i, t.augment(floor, destination))),
            )
        });

        let Some((assignee, trajectory)) = best else {
            warn!("No elevators to schedule {} on", passenger);
            return;
        };

        let request = AssignRequest::new(passenger.clone(), floor, assignee)
            .with_timing(trajectory.time_left_on_task(), trajectory.end_time());
        bus.fire_on(EventTopic::Scheduling, Event::AssignRequest(request));
    }
}

impl EventReactor for GreedyScheduler {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        if let Event::ScheduleRequest { passenger, floor } = event {
            self.handle_schedule_request(bus, passenger, *floor);
        }
    }
}

impl Scheduler for GreedyScheduler {
    fn set_elevators(&self, elevators: Vec<Arc<Elevator>>) {
        self.roster.set(elevators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingBus;
    use crate::models::Trajectory;

    const HOME_FLOORS: [i32; 3] = [3, 17, 25];

    fn elevators_at_t20() -> Vec<Arc<Elevator>> {
        let t = 20;
        let trajectories = [
            // done at t=30 on floor 1
            Trajectory::homing(HOME_FLOORS[0], t, 5).extend(8, 1),
            // done at t=38 on floor 15
            Trajectory::homing(HOME_FLOORS[1], t, 7).extend(2, 15),
            // done at t=24 on floor 13
            Trajectory::homing(HOME_FLOORS[2], t, 9).extend(10, 13),
        ];
        trajectories
            .into_iter()
            .enumerate()
            .map(|(i, trajectory)| Arc::new(Elevator::with_trajectory(i, 30, trajectory)))
            .collect()
    }

    fn schedule(scheduler: &GreedyScheduler, passenger: &Passenger, floor: i32) -> AssignRequest {
        let bus = RecordingBus::default();
        scheduler.on_event(
            &bus,
            &Event::ScheduleRequest {
                passenger: passenger.clone(),
                floor,
            },
        );

        bus.events()
            .into_iter()
            .find_map(|(topic, event)| match event {
                Event::AssignRequest(request) if topic == EventTopic::Scheduling => Some(request),
                _ => None,
            })
            .expect("an assignment")
    }

    #[test]
    fn test_already_included() {
        let scheduler = GreedyScheduler::new();
        scheduler.set_elevators(elevators_at_t20());

        // Elevator 1 already travels from 2 to 15
        let p1 = Passenger::new(14);
        let assignment = schedule(&scheduler, &p1, 4);

        assert_eq!(assignment.elevator, 1);
        assert_eq!(assignment.floor, 4);
        assert_eq!(assignment.passenger, p1);
        assert_eq!(assignment.time_left_on_task, Some(18));
        assert_eq!(assignment.end_time, Some(38));
    }

    #[test]
    fn test_open_scheduling() {
        let scheduler = GreedyScheduler::new();
        scheduler.set_elevators(elevators_at_t20());

        // Idle after 46, 40 and 36 ticks respectively
        let p1 = Passenger::new(10);
        let assignment = schedule(&scheduler, &p1, 20);

        assert_eq!(assignment.elevator, 2);
        assert_eq!(assignment.floor, 20);
        assert_eq!(assignment.passenger, p1);
        assert_eq!(assignment.end_time, Some(41));
    }

    #[test]
    fn test_falls_back_when_every_elevator_is_on_the_pickup_floor() {
        let scheduler = GreedyScheduler::new();
        scheduler.set_elevators((0..2).map(|i| Arc::new(Elevator::new(i, 10))).collect());

        let assignment = schedule(&scheduler, &Passenger::new(5), 0);
        assert_eq!(assignment.elevator, 0);
        assert_eq!(assignment.end_time, Some(5));
    }

    #[test]
    fn test_skips_elevator_on_the_pickup_floor() {
        let scheduler = GreedyScheduler::new();
        scheduler.set_elevators(vec![
            Arc::new(Elevator::with_trajectory(0, 10, Trajectory::new(0, 4))),
            Arc::new(Elevator::with_trajectory(1, 10, Trajectory::new(0, 2))),
        ]);

        let assignment = schedule(&scheduler, &Passenger::new(6), 4);
        assert_eq!(assignment.elevator, 1);
    }
}
