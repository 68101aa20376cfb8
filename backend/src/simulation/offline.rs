use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::event::{Event, RunnableEventBus};

/// Runs a simulation without delay.
///
/// Every tick is fired on the default topic and the bus is drained,
/// follow-ups included, before the next one.
pub struct OfflineSimulator {
    bus: Arc<dyn RunnableEventBus>,
    clock: AtomicI64,
}

impl OfflineSimulator {
    pub fn new(bus: Arc<dyn RunnableEventBus>) -> Self {
        Self {
            bus,
            clock: AtomicI64::new(0),
        }
    }

    /// Last tick fired; 0 before the first run.
    pub fn clock(&self) -> i64 {
        self.clock.load(Ordering::Acquire)
    }

    /// Fires ticks up to and including `limit`. Returns the number of events
    /// dispatched.
    pub fn run_to(&self, limit: i64) -> usize {
        let mut dispatched = 0;
        while self.clock() < limit {
            let tick = self.clock.fetch_add(1, Ordering::AcqRel) + 1;
            self.bus.fire(Event::tick(tick));
            dispatched += self.drain();
        }
        dispatched
    }

    /// Dispatches until no events are left.
    fn drain(&self) -> usize {
        let mut dispatched = 0;
        loop {
            match self.bus.process() {
                0 => return dispatched,
                n => dispatched += n,
            }
        }
    }
}
