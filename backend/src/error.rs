//! Error types for the Liftsim simulation engine.
//!
//! One enum per concern:
//!
//! - [`ConfigError`] - Configuration loading and validation
//! - [`BuildError`] - Building assembly
//! - [`QueueError`] - Deferred event scheduling
//! - [`RequestError`] - Passenger requests
//! - [`SimulationError`] - Bus workers and simulators
//! - [`JournalError`] - Event journal IO
//! - [`ServerError`] - HTTP server and CLI orchestration
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or validating a [`crate::config::SimulationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON.
    #[error("Invalid config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// =============================================================================
// Building Errors
// =============================================================================

/// Errors raised by [`crate::models::BuildingBuilder::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Number of floors missing or zero.
    #[error("Floors not set")]
    FloorsNotSet,

    /// More floors than a floor number can address.
    #[error("Too many floors: {0}")]
    TooManyFloors(usize),

    /// Number of elevators missing or zero.
    #[error("Number of elevators not set")]
    ElevatorsNotSet,

    /// No event bus given.
    #[error("Event bus not set")]
    EventBusNotSet,

    /// No scheduler given.
    #[error("Scheduler not set")]
    SchedulerNotSet,

    /// No deferred event queue given.
    #[error("Event queue not set")]
    EventQueueNotSet,

    /// Homing factory has fewer home floors than elevators.
    #[error("Expected {expected} home floors, got {actual}")]
    MissingHomeFloors { expected: usize, actual: usize },

    /// A home floor lies outside the building.
    #[error("Home floor {floor} is outside the building (0..{floors})")]
    HomeFloorOutOfRange { floor: i32, floors: usize },
}

// =============================================================================
// Deferred Queue Errors
// =============================================================================

/// Errors from [`crate::event::DeferredEventQueue`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Deferred time lies before the queue's clock.
    #[error("Cannot schedule an event in the past (at {at}, clock is {clock})")]
    InThePast { at: i64, clock: i64 },
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors for passenger requests entering a building.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Origin or destination lies outside the building.
    #[error("Floor {floor} is outside the building (0..{floors})")]
    FloorOutOfRange { floor: i32, floors: usize },

    /// Origin and destination are the same floor.
    #[error("Passenger is already on floor {0}")]
    SameFloor(i32),

    /// Deferring the request failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

// =============================================================================
// Simulation Errors
// =============================================================================

/// Errors while running a bus or a simulator.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Failed to spawn a worker thread.
    #[error("Failed to spawn worker '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked.
    #[error("Worker '{0}' died")]
    WorkerDied(String),

    /// Deferred scheduling failed.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

// =============================================================================
// Journal Errors
// =============================================================================

/// Errors from the JSON-lines event journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// IO error.
    #[error("Journal IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A line could not be (de)serialized.
    #[error("Journal JSON error at line {line}: {source}")]
    JsonError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Server Errors (top-level)
// =============================================================================

/// Top-level errors for the HTTP server and CLI commands.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Building assembly error.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Simulation error.
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// Queue error.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Rejected passenger request.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Journal error.
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    /// IO error (bind, read).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for building assembly.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for passenger requests.
pub type RequestResult<T> = Result<T, RequestError>;

/// Result type for bus and simulator operations.
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Result type for journal operations.
pub type JournalResult<T> = Result<T, JournalError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
