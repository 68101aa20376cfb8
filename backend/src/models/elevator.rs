use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use super::{Passenger, Trajectory};
use crate::event::{lock, AssignRequest, Event, EventBus, EventReactor, EventTopic};

/// A car moving along its [`Trajectory`], one floor per clock tick.
///
/// Loaded passengers are kept per destination floor so arrivals can drop
/// them in one go.
pub struct Elevator {
    id: usize,
    state: Mutex<ElevatorState>,
}

struct ElevatorState {
    trajectory: Trajectory,
    riding: Vec<HashSet<Passenger>>,
}

/// Serializable view of an elevator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorSnapshot {
    pub id: usize,
    pub floor: i32,
    pub turnpoints: Vec<i32>,
    pub time_left_on_task: i64,
    pub end_time: i64,
    pub passengers: usize,
    pub idle: bool,
}

impl Elevator {
    pub fn new(id: usize, num_floors: usize) -> Self {
        Self::with_trajectory(id, num_floors, Trajectory::new(0, 0))
    }

    pub fn with_trajectory(id: usize, num_floors: usize, trajectory: Trajectory) -> Self {
        Self {
            id,
            state: Mutex::new(ElevatorState {
                trajectory,
                riding: vec![HashSet::new(); num_floors],
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn current_floor(&self) -> i32 {
        lock(&self.state).trajectory.current_floor()
    }

    /// Copy of the current trajectory.
    pub fn trajectory(&self) -> Trajectory {
        lock(&self.state).trajectory.clone()
    }

    /// Passengers currently riding.
    pub fn passengers(&self) -> HashSet<Passenger> {
        lock(&self.state).riding.iter().flatten().cloned().collect()
    }

    pub fn snapshot(&self) -> ElevatorSnapshot {
        let state = lock(&self.state);
        ElevatorSnapshot {
            id: self.id,
            floor: state.trajectory.current_floor(),
            turnpoints: state.trajectory.turnpoints(),
            time_left_on_task: state.trajectory.time_left_on_task(),
            end_time: state.trajectory.end_time(),
            passengers: state.riding.iter().map(HashSet::len).sum(),
            idle: state.trajectory.is_idle(),
        }
    }

    fn arrival(&self, trajectory: &Trajectory) -> Option<Event> {
        trajectory.should_stop().then(|| Event::ElevatorArrived {
            elevator: self.id,
            floor: trajectory.current_floor(),
            clock: trajectory.current_time(),
        })
    }

    fn handle_clock_tick(&self, bus: &dyn EventBus, now: i64) {
        let mut follow_ups = Vec::with_capacity(2);
        {
            let mut state = lock(&self.state);
            let old = &state.trajectory;
            if old.current_time() >= now {
                warn!("Elevator #{}: spurious clock tick {}", self.id, now);
                return;
            }

            let new = old.step();
            let became_idle = old.is_moving() && new.is_idle();
            follow_ups.extend(self.arrival(&new));
            if became_idle {
                follow_ups.push(Event::ElevatorIdle {
                    elevator: self.id,
                    floor: new.current_floor(),
                });
            }
            state.trajectory = new;
        }

        for event in follow_ups {
            bus.fire_on(EventTopic::Elevator, event);
        }
    }

    fn handle_assign_request(&self, bus: &dyn EventBus, request: &AssignRequest) {
        let origin = request.floor;
        let destination = request.passenger.destination();

        let arrival = {
            let mut state = lock(&self.state);
            let augmented = state.trajectory.augment(origin, destination);

            // The plan moved on while the scheduler was deciding
            if request.end_time.is_some_and(|end| end != augmented.end_time()) {
                drop(state);
                debug!("Elevator #{}: stale assignment {}", self.id, request);
                bus.fire_on(EventTopic::Scheduling, Event::RequestRejected(request.clone()));
                return;
            }

            let arrival = self.arrival(&augmented);
            state.trajectory = augmented;
            arrival
        };

        bus.fire_on(EventTopic::Scheduling, Event::RequestAccepted(request.clone()));
        if let Some(event) = arrival {
            bus.fire_on(EventTopic::Elevator, event);
        }
    }

    fn handle_load_passenger(&self, passenger: &Passenger) {
        let destination = passenger.destination();
        let Ok(index) = usize::try_from(destination) else {
            warn!("Elevator #{}: {} heads to floor {}", self.id, passenger, destination);
            return;
        };
        match lock(&self.state).riding.get_mut(index) {
            Some(riders) => {
                riders.insert(passenger.clone());
            }
            None => warn!(
                "Elevator #{}: {} heads to unknown floor {}",
                self.id, passenger, destination
            ),
        }
    }

    fn handle_arrived(&self, bus: &dyn EventBus, floor: i32) {
        let Ok(index) = usize::try_from(floor) else {
            return;
        };
        let to_drop: Vec<Passenger> = match lock(&self.state).riding.get_mut(index) {
            Some(riders) => riders.drain().collect(),
            None => return,
        };

        for passenger in to_drop {
            bus.fire_on(
                EventTopic::Passenger,
                Event::DropPassenger {
                    floor,
                    elevator: self.id,
                    passenger,
                },
            );
        }
    }
}

impl EventReactor for Elevator {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        match event {
            Event::ClockTick { value } => self.handle_clock_tick(bus, *value),
            Event::AssignRequest(request) if request.elevator == self.id => {
                self.handle_assign_request(bus, request)
            }
            Event::LoadPassenger {
                elevator,
                passenger,
                ..
            } if *elevator == self.id => self.handle_load_passenger(passenger),
            Event::ElevatorArrived { elevator, floor, .. } if *elevator == self.id => {
                self.handle_arrived(bus, *floor)
            }
            _ => {}
        }
    }
}

impl fmt::Display for Elevator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Elevator #{}", self.id)
    }
}
