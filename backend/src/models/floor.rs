use log::warn;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use super::Passenger;
use crate::event::{lock, AssignRequest, Event, EventBus, EventReactor, EventTopic};

/// A landing where passengers wait for the elevator they were assigned to.
pub struct Floor {
    id: i32,
    clock: AtomicI64,
    waiting: Mutex<Vec<HashSet<Passenger>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorSnapshot {
    pub id: i32,
    pub waiting: usize,
}

impl Floor {
    pub fn new(id: i32, num_elevators: usize) -> Self {
        Self {
            id,
            clock: AtomicI64::new(0),
            waiting: Mutex::new(vec![HashSet::new(); num_elevators]),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// Last clock tick seen.
    pub fn clock(&self) -> i64 {
        self.clock.load(Ordering::Acquire)
    }

    /// Everyone waiting on this floor, for any elevator.
    pub fn passengers(&self) -> HashSet<Passenger> {
        lock(&self.waiting).iter().flatten().cloned().collect()
    }

    pub fn snapshot(&self) -> FloorSnapshot {
        FloorSnapshot {
            id: self.id,
            waiting: lock(&self.waiting).iter().map(HashSet::len).sum(),
        }
    }

    fn handle_request_accepted(&self, bus: &dyn EventBus, request: &AssignRequest) {
        let mut waiting = lock(&self.waiting);
        let Some(queue) = waiting.get_mut(request.elevator) else {
            warn!("Floor #{}: unknown elevator #{}", self.id, request.elevator);
            return;
        };
        queue.insert(request.passenger.clone());

        // Fired under the lock so an arrival cannot slip in between
        bus.fire_on(
            EventTopic::Passenger,
            Event::PassengerWaiting {
                passenger: request.passenger.clone(),
                floor: self.id,
                elevator: request.elevator,
            },
        );
    }

    fn handle_elevator_arrived(&self, bus: &dyn EventBus, elevator: usize, arrived_at: i64) {
        let mut waiting = lock(&self.waiting);
        let Some(queue) = waiting.get_mut(elevator) else {
            return;
        };

        let missed = arrived_at < self.clock();
        for passenger in queue.drain() {
            let event = if missed {
                Event::MissedConnection {
                    floor: self.id,
                    elevator,
                    passenger,
                }
            } else {
                Event::LoadPassenger {
                    floor: self.id,
                    elevator,
                    passenger,
                }
            };
            bus.fire_on(EventTopic::Passenger, event);
        }
    }
}

impl EventReactor for Floor {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        match event {
            Event::ClockTick { value } => self.clock.store(*value, Ordering::Release),
            Event::RequestAccepted(request) if request.floor == self.id => {
                self.handle_request_accepted(bus, request)
            }
            Event::ElevatorArrived {
                elevator,
                floor,
                clock,
            } if *floor == self.id => self.handle_elevator_arrived(bus, *elevator, *clock),
            _ => {}
        }
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Floor #{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingBus;

    fn accepted(passenger: &Passenger, floor: i32, elevator: usize) -> Event {
        Event::RequestAccepted(AssignRequest::new(passenger.clone(), floor, elevator))
    }

    fn arrived(elevator: usize, floor: i32, clock: i64) -> Event {
        Event::ElevatorArrived {
            elevator,
            floor,
            clock,
        }
    }

    #[test]
    fn test_request_assignment() {
        let bus = RecordingBus::default();
        let origin = Floor::new(5, 2);
        let destination = Floor::new(8, 2);
        let passenger = Passenger::new(8);

        origin.on_event(&bus, &accepted(&passenger, 5, 0));
        destination.on_event(&bus, &accepted(&passenger, 5, 0));
        assert_eq!(origin.passengers().len(), 1);
        assert!(destination.passengers().is_empty());

        origin.on_event(&bus, &arrived(0, 5, 0));
        destination.on_event(&bus, &arrived(0, 5, 0));

        let fired = bus.events();
        assert_eq!(
            fired,
            vec![
                (
                    EventTopic::Passenger,
                    Event::PassengerWaiting {
                        passenger: passenger.clone(),
                        floor: 5,
                        elevator: 0,
                    }
                ),
                (
                    EventTopic::Passenger,
                    Event::LoadPassenger {
                        floor: 5,
                        elevator: 0,
                        passenger,
                    }
                ),
            ]
        );
        assert!(origin.passengers().is_empty());
    }

    #[test]
    fn test_only_loads_for_the_arriving_elevator() {
        let bus = RecordingBus::default();
        let floor = Floor::new(2, 3);
        let passenger = Passenger::new(0);

        floor.on_event(&bus, &accepted(&passenger, 2, 1));
        floor.on_event(&bus, &arrived(2, 2, 0));
        assert_eq!(floor.snapshot().waiting, 1);

        floor.on_event(&bus, &arrived(1, 2, 0));
        assert_eq!(floor.snapshot().waiting, 0);
    }

    #[test]
    fn test_late_arrival_is_a_missed_connection() {
        let bus = RecordingBus::default();
        let floor = Floor::new(3, 1);
        let passenger = Passenger::new(9);

        floor.on_event(&bus, &Event::tick(7));
        floor.on_event(&bus, &accepted(&passenger, 3, 0));
        floor.on_event(&bus, &arrived(0, 3, 6));

        assert_eq!(floor.clock(), 7);
        assert!(matches!(
            bus.events().last(),
            Some((EventTopic::Passenger, Event::MissedConnection { floor: 3, elevator: 0, .. }))
        ));
    }
}
