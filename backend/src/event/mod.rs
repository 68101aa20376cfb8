//! Event model and event buses.
//!
//! The simulation is a set of [`EventReactor`]s attached to an [`EventBus`].
//! A reactor handles one event at a time and may fire follow-up events on
//! the bus it was handed.
//!
//! # Buses
//!
//! | Bus                       | Routing              | Driving                     |
//! |---------------------------|----------------------|-----------------------------|
//! | [`SynchronizedEventBus`]  | every reactor        | `process()` or `run()`      |
//! | [`PartitionedEventBus`]   | per [`EventTopic`]   | one worker pool per topic   |
//!
//! [`DeferredEventQueue`] is a reactor that holds events back until a given
//! clock tick.

pub mod bus;
pub mod deferred;
pub mod partitioned;
pub mod synchronized;
pub mod topic;

pub use bus::{EventBus, EventReactor, RunnableEventBus, SharedReactor};
pub use deferred::DeferredEventQueue;
pub use partitioned::PartitionedEventBus;
pub use synchronized::SynchronizedEventBus;
pub use topic::{OverloadStrategy, TopicBus};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::Passenger;

// =============================================================================
// Topics
// =============================================================================

/// Partition key for events.
///
/// Every event is fired on exactly one topic; a reactor may subscribe to
/// several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventTopic {
    Default,
    Scheduling,
    Elevator,
    Passenger,
}

impl EventTopic {
    /// All topics, in partition order.
    pub const ALL: [EventTopic; 4] = [
        EventTopic::Default,
        EventTopic::Scheduling,
        EventTopic::Elevator,
        EventTopic::Passenger,
    ];

    /// Position of the topic in [`EventTopic::ALL`].
    pub fn index(self) -> usize {
        match self {
            EventTopic::Default => 0,
            EventTopic::Scheduling => 1,
            EventTopic::Elevator => 2,
            EventTopic::Passenger => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventTopic::Default => "DEFAULT",
            EventTopic::Scheduling => "SCHEDULING",
            EventTopic::Elevator => "ELEVATOR",
            EventTopic::Passenger => "PASSENGER",
        }
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Health
// =============================================================================

/// Load indicator of a bus, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Good,
    Degraded,
    Critical,
}

// =============================================================================
// Events
// =============================================================================

/// Assignment of a waiting passenger to an elevator.
///
/// Schedulers that simulate the assignment attach the expected timing so the
/// elevator can detect that its trajectory moved on in the meantime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub passenger: Passenger,
    /// Floor where the passenger waits.
    pub floor: i32,
    pub elevator: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_left_on_task: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

impl AssignRequest {
    pub fn new(passenger: Passenger, floor: i32, elevator: usize) -> Self {
        Self {
            passenger,
            floor,
            elevator,
            time_left_on_task: None,
            end_time: None,
        }
    }

    pub fn with_timing(mut self, time_left_on_task: i64, end_time: i64) -> Self {
        self.time_left_on_task = Some(time_left_on_task);
        self.end_time = Some(end_time);
        self
    }
}

/// Everything that can happen in a simulated building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// Simulation clock advanced to `value`.
    ClockTick { value: i64 },
    /// A passenger at `floor` asks to be carried to its destination.
    ScheduleRequest { passenger: Passenger, floor: i32 },
    AssignRequest(AssignRequest),
    RequestAccepted(AssignRequest),
    RequestRejected(AssignRequest),
    PassengerWaiting {
        passenger: Passenger,
        floor: i32,
        elevator: usize,
    },
    LoadPassenger {
        floor: i32,
        elevator: usize,
        passenger: Passenger,
    },
    DropPassenger {
        floor: i32,
        elevator: usize,
        passenger: Passenger,
    },
    /// The elevator arrived before the passenger was registered as waiting.
    MissedConnection {
        floor: i32,
        elevator: usize,
        passenger: Passenger,
    },
    ElevatorArrived {
        elevator: usize,
        floor: i32,
        clock: i64,
    },
    ElevatorIdle { elevator: usize, floor: i32 },
}

impl Event {
    pub fn tick(value: i64) -> Self {
        Event::ClockTick { value }
    }

    /// Topic the model fires this event on.
    pub fn topic(&self) -> EventTopic {
        match self {
            Event::ClockTick { .. } => EventTopic::Default,
            Event::ScheduleRequest { .. }
            | Event::AssignRequest(_)
            | Event::RequestAccepted(_)
            | Event::RequestRejected(_) => EventTopic::Scheduling,
            Event::ElevatorArrived { .. } | Event::ElevatorIdle { .. } => EventTopic::Elevator,
            Event::PassengerWaiting { .. }
            | Event::LoadPassenger { .. }
            | Event::DropPassenger { .. }
            | Event::MissedConnection { .. } => EventTopic::Passenger,
        }
    }

    /// Variant name, as used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ClockTick { .. } => "ClockTick",
            Event::ScheduleRequest { .. } => "ScheduleRequest",
            Event::AssignRequest(_) => "AssignRequest",
            Event::RequestAccepted(_) => "RequestAccepted",
            Event::RequestRejected(_) => "RequestRejected",
            Event::PassengerWaiting { .. } => "PassengerWaiting",
            Event::LoadPassenger { .. } => "LoadPassenger",
            Event::DropPassenger { .. } => "DropPassenger",
            Event::MissedConnection { .. } => "MissedConnection",
            Event::ElevatorArrived { .. } => "ElevatorArrived",
            Event::ElevatorIdle { .. } => "ElevatorIdle",
        }
    }
}

impl fmt::Display for AssignRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at floor {} -> elevator #{}",
            self.passenger, self.floor, self.elevator
        )?;
        if let Some(end) = self.end_time {
            write!(f, " (done at t={})", end)?;
        }
        Ok(())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ClockTick { value } => write!(f, "{}", value),
            Event::ScheduleRequest { passenger, floor } => {
                write!(f, "{} at floor {}", passenger, floor)
            }
            Event::AssignRequest(request)
            | Event::RequestAccepted(request)
            | Event::RequestRejected(request) => write!(f, "{}", request),
            Event::PassengerWaiting {
                passenger,
                floor,
                elevator,
            } => write!(f, "{} waits at floor {} for elevator #{}", passenger, floor, elevator),
            Event::LoadPassenger {
                floor,
                elevator,
                passenger,
            }
            | Event::DropPassenger {
                floor,
                elevator,
                passenger,
            }
            | Event::MissedConnection {
                floor,
                elevator,
                passenger,
            } => write!(f, "{} / elevator #{} / floor {}", passenger, elevator, floor),
            Event::ElevatorArrived {
                elevator,
                floor,
                clock,
            } => write!(f, "elevator #{} at floor {} (t={})", elevator, floor, clock),
            Event::ElevatorIdle { elevator, floor } => {
                write!(f, "elevator #{} idle at floor {}", elevator, floor)
            }
        }
    }
}

// =============================================================================
// Lock helpers
// =============================================================================

// Reactor state stays consistent between events, so a poisoned lock is still usable.

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw.write().unwrap_or_else(PoisonError::into_inner)
}

/// Bus that records what reactors fire instead of dispatching it.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingBus {
    pub fired: Mutex<Vec<(EventTopic, Event)>>,
}

#[cfg(test)]
impl RecordingBus {
    pub fn events(&self) -> Vec<(EventTopic, Event)> {
        lock(&self.fired).clone()
    }
}

#[cfg(test)]
impl EventBus for RecordingBus {
    fn attach_to(&self, _: &[EventTopic], _: SharedReactor) {}

    fn fire_on(&self, topic: EventTopic, event: Event) {
        lock(&self.fired).push((topic, event));
    }
}
