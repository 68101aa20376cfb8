//! # Liftsim - event-driven elevator dispatch simulation
//!
//! A building is a set of reactors (floors, elevators, a scheduler) wired to
//! an event bus. A simulator drives the clock; everything else happens in
//! response to events.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Simulator  │────▶│  Event bus  │────▶│  Reactors   │────▶│  Journal /  │
//! │ (ClockTick) │     │ (by topic)  │◀────│ (follow-ups)│     │  SSE / logs │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use liftsim::{OfflineSimulator, SimulationConfig};
//!
//! let config = SimulationConfig::default();
//! let building = config.building_builder().build()?;
//! building.request_at(5, 0, 12)?;
//!
//! OfflineSimulator::new(building.bus().clone()).run_to(60);
//! println!("{}", serde_json::to_string_pretty(&building.snapshot())?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`config`] - Simulation configuration
//! - [`event`] - Events, reactors and buses
//! - [`models`] - Passengers, trajectories, elevators, floors, buildings
//! - [`scheduling`] - Schedulers and retry reactors
//! - [`simulation`] - Offline and fixed-rate simulators
//! - [`monitor`] - Journal, logging and event broadcasting
//! - [`logging`] - Console logger
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod event;
pub mod models;

// Behaviour
pub mod scheduling;
pub mod simulation;

// Observability
pub mod logging;
pub mod monitor;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BuildError, ConfigError, JournalError, QueueError, RequestError, ServerError,
    SimulationError,
};

// =============================================================================
// Re-exports - Core
// =============================================================================

pub use config::{BusKind, SchedulerKind, SimulationConfig};
pub use event::{
    DeferredEventQueue, Event, EventBus, EventReactor, EventTopic, Health, PartitionedEventBus,
    RunnableEventBus, SynchronizedEventBus,
};
pub use models::{Building, BuildingSnapshot, ElevatorFactory, Passenger, Trajectory};
pub use scheduling::{FlockScheduler, GreedyScheduler, RoundRobinScheduler, Scheduler};
pub use simulation::{FixedRateSimulator, OfflineSimulator, TripCounter, WatchdogReactor};

// =============================================================================
// Re-exports - Observability & API
// =============================================================================

pub use api::start_server;
pub use logging::ConsoleLogger;
pub use monitor::{monitor, EventBroadcaster, JournalReader, JournalWriter, LoggingReactor};
