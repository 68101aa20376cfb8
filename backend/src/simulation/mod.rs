//! Simulators driving a building's clock.
//!
//! - [`OfflineSimulator`] - ticks as fast as the bus drains, for tests and batch runs
//! - [`FixedRateSimulator`] - ticks on wall-clock time while bus workers run
//! - [`WatchdogReactor`] - flags arrivals reported with a stale clock
//! - [`TripCounter`] - counts passenger traffic for summaries

pub mod fixed_rate;
pub mod offline;
pub mod stats;
pub mod watchdog;

pub use fixed_rate::FixedRateSimulator;
pub use offline::OfflineSimulator;
pub use stats::{TripCounter, TripSummary};
pub use watchdog::WatchdogReactor;
