//! HTTP API module.
//!
//! Serves a running simulation: building snapshots, passenger requests and
//! live event and log streams.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server, AppState};
pub use types::*;
