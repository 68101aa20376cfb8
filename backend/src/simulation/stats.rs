use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::event::{Event, EventBus, EventReactor};

/// Counts passenger traffic for run summaries.
#[derive(Debug, Default)]
pub struct TripCounter {
    clock: AtomicI64,
    requested: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    loaded: AtomicU64,
    delivered: AtomicU64,
    missed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub clock: i64,
    /// Schedule requests, retries included.
    pub requested: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub loaded: u64,
    pub delivered: u64,
    pub missed: u64,
}

impl TripCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> TripSummary {
        let get = |counter: &AtomicU64| counter.load(Ordering::Acquire);
        TripSummary {
            clock: self.clock.load(Ordering::Acquire),
            requested: get(&self.requested),
            accepted: get(&self.accepted),
            rejected: get(&self.rejected),
            loaded: get(&self.loaded),
            delivered: get(&self.delivered),
            missed: get(&self.missed),
        }
    }
}

impl EventReactor for TripCounter {
    fn on_event(&self, _bus: &dyn EventBus, event: &Event) {
        let counter = match event {
            Event::ClockTick { value } => {
                self.clock.fetch_max(*value, Ordering::AcqRel);
                return;
            }
            Event::ScheduleRequest { .. } => &self.requested,
            Event::RequestAccepted(_) => &self.accepted,
            Event::RequestRejected(_) => &self.rejected,
            Event::LoadPassenger { .. } => &self.loaded,
            Event::DropPassenger { .. } => &self.delivered,
            Event::MissedConnection { .. } => &self.missed,
            _ => return,
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }
}
