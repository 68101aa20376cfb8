//! Building model: passengers, trajectories, elevators and floors.
//!
//! - [`Passenger`] - A rider with a destination
//! - [`Trajectory`] - Immutable plan of an elevator
//! - [`Elevator`] / [`Floor`] - Reactors moving passengers around
//! - [`Building`] - Floors and elevators wired to a bus

pub mod building;
pub mod elevator;
pub mod floor;
pub mod passenger;
pub mod splice;
pub mod trajectory;

pub use building::{Building, BuildingBuilder, BuildingSnapshot, ElevatorFactory};
pub use elevator::{Elevator, ElevatorSnapshot};
pub use floor::{Floor, FloorSnapshot};
pub use passenger::Passenger;
pub use splice::splice;
pub use trajectory::{IdleBehavior, Trajectory};
