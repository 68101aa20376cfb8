use log::error;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::event::{Event, EventBus, EventReactor};

/// Watches the clock reported by arrivals against the latest tick.
///
/// An arrival more than one tick away from the clock means the bus is
/// falling behind.
#[derive(Debug, Default)]
pub struct WatchdogReactor {
    clock: AtomicI64,
    lagging: AtomicU64,
}

impl WatchdogReactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> i64 {
        self.clock.load(Ordering::Acquire)
    }

    /// Number of late arrivals seen so far.
    pub fn lagging(&self) -> u64 {
        self.lagging.load(Ordering::Acquire)
    }
}

impl EventReactor for WatchdogReactor {
    fn on_event(&self, _bus: &dyn EventBus, event: &Event) {
        match event {
            Event::ClockTick { value } => self.clock.store(*value, Ordering::Release),
            Event::ElevatorArrived { clock, elevator, .. } => {
                let lag = (clock - self.clock()).abs();
                if lag > 1 {
                    self.lagging.fetch_add(1, Ordering::AcqRel);
                    error!(
                        "Event bus is saturated: elevator #{} reported t={} at t={}",
                        elevator,
                        clock,
                        self.clock()
                    );
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingBus;

    fn arrival(clock: i64) -> Event {
        Event::ElevatorArrived {
            elevator: 0,
            floor: 2,
            clock,
        }
    }

    #[test]
    fn test_flags_only_stale_arrivals() {
        let bus = RecordingBus::default();
        let watchdog = WatchdogReactor::new();

        watchdog.on_event(&bus, &Event::tick(10));
        watchdog.on_event(&bus, &arrival(10));
        watchdog.on_event(&bus, &arrival(9));
        assert_eq!(watchdog.lagging(), 0);

        watchdog.on_event(&bus, &arrival(7));
        assert_eq!(watchdog.lagging(), 1);
        assert_eq!(watchdog.clock(), 10);
        assert!(bus.events().is_empty());
    }
}
