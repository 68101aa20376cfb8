//! Building assembly.
//!
//! ```text
//!                      ┌────────────────────┐
//!   ScheduleRequest ──▶│     Scheduler      │── AssignRequest ──┐
//!                      └────────────────────┘                   ▼
//!   ┌───────────┐  RequestAccepted  ┌──────────┐  Arrived  ┌──────────┐
//!   │   Floor   │◀──────────────────│ Elevator │──────────▶│  Floor   │
//!   └───────────┘                   └──────────┘           └──────────┘
//!         │ Load / MissedConnection       ▲ Drop
//!         └───────────────────────────────┘
//! ```
//!
//! [`BuildingBuilder`] creates floors and elevators and attaches every
//! reactor to the bus on the topics it listens to.

use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Elevator, ElevatorSnapshot, Floor, FloorSnapshot, Passenger, Trajectory};
use crate::error::{BuildError, BuildResult, RequestError, RequestResult};
use crate::event::{
    DeferredEventQueue, Event, EventTopic, Health, RunnableEventBus, SharedReactor,
};
use crate::scheduling::{RejectionReactor, ReschedulingReactor, Scheduler};

// =============================================================================
// Elevator factory
// =============================================================================

/// How elevators are created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "homeFloors", rename_all = "lowercase")]
pub enum ElevatorFactory {
    /// Start on floor 0 and stay where the last task ended.
    #[default]
    Standard,
    /// Start on the given home floor and return there when idle; one entry
    /// per elevator.
    Homing(Vec<i32>),
}

impl ElevatorFactory {
    fn validate(&self, num_floors: usize, num_elevators: usize) -> BuildResult<()> {
        let ElevatorFactory::Homing(homes) = self else {
            return Ok(());
        };

        if homes.len() < num_elevators {
            return Err(BuildError::MissingHomeFloors {
                expected: num_elevators,
                actual: homes.len(),
            });
        }
        match homes.iter().find(|&&h| !floor_in_range(h, num_floors)) {
            Some(&floor) => Err(BuildError::HomeFloorOutOfRange {
                floor,
                floors: num_floors,
            }),
            None => Ok(()),
        }
    }

    fn create(&self, id: usize, num_floors: usize) -> Elevator {
        match self {
            ElevatorFactory::Standard => Elevator::new(id, num_floors),
            ElevatorFactory::Homing(homes) => {
                let home = homes[id];
                Elevator::with_trajectory(id, num_floors, Trajectory::homing(home, 0, home))
            }
        }
    }
}

fn floor_in_range(floor: i32, num_floors: usize) -> bool {
    usize::try_from(floor).is_ok_and(|f| f < num_floors)
}

// =============================================================================
// Building
// =============================================================================

/// Floors and elevators wired to one event bus.
pub struct Building {
    floors: Vec<Arc<Floor>>,
    elevators: Vec<Arc<Elevator>>,
    event_queue: Arc<DeferredEventQueue>,
    scheduler: Arc<dyn Scheduler>,
    bus: Arc<dyn RunnableEventBus>,
}

/// Serializable state of a whole building.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingSnapshot {
    pub clock: i64,
    pub health: Health,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog: Option<usize>,
    pub elevators: Vec<ElevatorSnapshot>,
    pub floors: Vec<FloorSnapshot>,
}

impl Building {
    pub fn builder() -> BuildingBuilder {
        BuildingBuilder::default()
    }

    pub fn num_floors(&self) -> usize {
        self.floors.len()
    }

    pub fn num_elevators(&self) -> usize {
        self.elevators.len()
    }

    pub fn floor(&self, i: usize) -> Option<&Arc<Floor>> {
        self.floors.get(i)
    }

    pub fn elevator(&self, i: usize) -> Option<&Arc<Elevator>> {
        self.elevators.get(i)
    }

    pub fn elevators(&self) -> &[Arc<Elevator>] {
        &self.elevators
    }

    pub fn event_queue(&self) -> &Arc<DeferredEventQueue> {
        &self.event_queue
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn bus(&self) -> &Arc<dyn RunnableEventBus> {
        &self.bus
    }

    fn check_request(&self, origin: i32, destination: i32) -> RequestResult<()> {
        for floor in [origin, destination] {
            if !floor_in_range(floor, self.num_floors()) {
                return Err(RequestError::FloorOutOfRange {
                    floor,
                    floors: self.num_floors(),
                });
            }
        }
        if origin == destination {
            return Err(RequestError::SameFloor(origin));
        }
        Ok(())
    }

    /// Publishes a schedule request for a new passenger right away.
    pub fn request(&self, origin: i32, destination: i32) -> RequestResult<Passenger> {
        self.check_request(origin, destination)?;

        let passenger = Passenger::new(destination);
        self.bus.fire_on(
            EventTopic::Scheduling,
            Event::ScheduleRequest {
                passenger: passenger.clone(),
                floor: origin,
            },
        );
        Ok(passenger)
    }

    /// Defers a schedule request for a new passenger until tick `at`.
    pub fn request_at(&self, at: i64, origin: i32, destination: i32) -> RequestResult<Passenger> {
        self.check_request(origin, destination)?;

        let passenger = Passenger::new(destination);
        self.event_queue.schedule_at_on(
            at,
            EventTopic::Scheduling,
            Event::ScheduleRequest {
                passenger: passenger.clone(),
                floor: origin,
            },
        )?;
        Ok(passenger)
    }

    pub fn snapshot(&self) -> BuildingSnapshot {
        BuildingSnapshot {
            clock: self.event_queue.clock(),
            health: self.bus.health(),
            backlog: self.bus.backlog(),
            elevators: self.elevators.iter().map(|e| e.snapshot()).collect(),
            floors: self.floors.iter().map(|f| f.snapshot()).collect(),
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

#[derive(Default)]
pub struct BuildingBuilder {
    num_floors: usize,
    num_elevators: usize,
    bus: Option<Arc<dyn RunnableEventBus>>,
    event_queue: Option<Arc<DeferredEventQueue>>,
    scheduler: Option<(Arc<dyn Scheduler>, SharedReactor)>,
    factory: ElevatorFactory,
    reactors: Vec<SharedReactor>,
}

impl BuildingBuilder {
    pub fn floors(mut self, n: usize) -> Self {
        self.num_floors = n;
        self
    }

    pub fn elevators(mut self, n: usize) -> Self {
        self.num_elevators = n;
        self
    }

    pub fn event_bus(mut self, bus: Arc<dyn RunnableEventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn event_queue(mut self, queue: Arc<DeferredEventQueue>) -> Self {
        self.event_queue = Some(queue);
        self
    }

    pub fn scheduler<S: Scheduler + 'static>(mut self, scheduler: Arc<S>) -> Self {
        let handle: Arc<dyn Scheduler> = scheduler.clone();
        let reactor: SharedReactor = scheduler;
        self.scheduler = Some((handle, reactor));
        self
    }

    pub fn elevator_factory(mut self, factory: ElevatorFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Attaches an extra reactor to every topic, e.g. a journal or a logger.
    pub fn reactor(mut self, reactor: SharedReactor) -> Self {
        self.reactors.push(reactor);
        self
    }

    pub fn build(self) -> BuildResult<Building> {
        if self.num_floors == 0 {
            return Err(BuildError::FloorsNotSet);
        }
        let top_floor =
            i32::try_from(self.num_floors).map_err(|_| BuildError::TooManyFloors(self.num_floors))?;
        if self.num_elevators == 0 {
            return Err(BuildError::ElevatorsNotSet);
        }
        let bus = self.bus.ok_or(BuildError::EventBusNotSet)?;
        let (scheduler, scheduler_reactor) = self.scheduler.ok_or(BuildError::SchedulerNotSet)?;
        let event_queue = self.event_queue.ok_or(BuildError::EventQueueNotSet)?;
        self.factory.validate(self.num_floors, self.num_elevators)?;

        bus.attach(event_queue.clone());
        bus.attach_to(&[EventTopic::Default, EventTopic::Scheduling], scheduler_reactor);
        bus.attach_to(&[EventTopic::Scheduling], Arc::new(RejectionReactor));
        bus.attach_to(&[EventTopic::Passenger], Arc::new(ReschedulingReactor));
        for reactor in self.reactors {
            bus.attach(reactor);
        }

        let floors: Vec<Arc<Floor>> = (0..top_floor)
            .map(|i| Arc::new(Floor::new(i, self.num_elevators)))
            .collect();
        for floor in &floors {
            bus.attach_to(
                &[EventTopic::Default, EventTopic::Elevator, EventTopic::Scheduling],
                floor.clone(),
            );
        }

        let elevators: Vec<Arc<Elevator>> = (0..self.num_elevators)
            .map(|i| Arc::new(self.factory.create(i, self.num_floors)))
            .collect();
        for elevator in &elevators {
            bus.attach(elevator.clone());
        }

        scheduler.set_elevators(elevators.clone());
        info!(
            "Built a building with {} floors and {} elevators",
            floors.len(),
            elevators.len()
        );

        Ok(Building {
            floors,
            elevators,
            event_queue,
            scheduler,
            bus,
        })
    }
}
