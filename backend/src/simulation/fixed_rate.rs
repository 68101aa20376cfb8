use log::{error, info};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{SimulationError, SimulationResult};
use crate::event::{Event, RunnableEventBus};

/// Delay before the first tick.
pub const INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Longest uninterrupted sleep of the ticker, so shutdown is noticed quickly.
const SLEEP_SLICE: Duration = Duration::from_millis(20);

/// Fires a clock tick every `rate` while the bus workers run.
///
/// ```text
///   ticker thread ── ClockTick(1), ClockTick(2), ... ──▶ bus.run_dynamic()
///                                                         │
///   shutdown() ──────────────────── stops both ◀──────────┘
/// ```
pub struct FixedRateSimulator {
    bus: Arc<dyn RunnableEventBus>,
    rate_ms: AtomicU64,
    clock: AtomicI64,
    shutdown: AtomicBool,
}

impl FixedRateSimulator {
    pub fn new(bus: Arc<dyn RunnableEventBus>, rate: Duration) -> Self {
        Self {
            bus,
            rate_ms: AtomicU64::new(millis(rate)),
            clock: AtomicI64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn rate(&self) -> Duration {
        Duration::from_millis(self.rate_ms.load(Ordering::Acquire))
    }

    /// Changes the tick period, effective from the next tick.
    pub fn set_rate(&self, rate: Duration) {
        self.rate_ms.store(millis(rate), Ordering::Release);
    }

    /// Last tick fired.
    pub fn clock(&self) -> i64 {
        self.clock.load(Ordering::Acquire)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Asks the ticker and the bus workers to stop.
    pub fn shutdown(&self) {
        info!("Shutdown signal sent");
        self.shutdown.store(true, Ordering::Release);
    }

    /// Runs the simulation, blocking the current thread until [`shutdown`]
    /// is called or a worker dies.
    ///
    /// [`shutdown`]: FixedRateSimulator::shutdown
    pub fn start(&self) -> SimulationResult<()> {
        thread::scope(|s| {
            let ticker = thread::Builder::new()
                .name("clock".into())
                .spawn_scoped(s, || self.tick_loop())
                .map_err(|source| SimulationError::Spawn {
                    name: "clock".into(),
                    source,
                })?;

            let result = self.bus.run_dynamic(&self.shutdown);

            // The bus can also stop on its own when a worker dies
            self.shutdown.store(true, Ordering::Release);
            if ticker.join().is_err() {
                error!("Clock thread died");
            }

            info!("Shutting down simulation at t={}", self.clock());
            result
        })
    }

    fn tick_loop(&self) {
        let mut next = Instant::now() + INITIAL_DELAY;
        loop {
            if !self.sleep_until(next) {
                return;
            }

            let tick = self.clock.fetch_add(1, Ordering::AcqRel) + 1;
            self.bus.fire(Event::tick(tick));
            next += self.rate();
        }
    }

    /// Returns `false` when shut down while waiting.
    fn sleep_until(&self, deadline: Instant) -> bool {
        loop {
            if self.is_shut_down() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

fn millis(rate: Duration) -> u64 {
    u64::try_from(rate.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SynchronizedEventBus;

    #[test]
    fn test_rate_is_adjustable() {
        let simulator = FixedRateSimulator::new(
            Arc::new(SynchronizedEventBus::new()),
            Duration::from_millis(1000),
        );
        assert_eq!(simulator.rate(), Duration::from_millis(1000));

        simulator.set_rate(Duration::from_millis(250));
        assert_eq!(simulator.rate(), Duration::from_millis(250));

        simulator.set_rate(Duration::ZERO);
        assert_eq!(simulator.rate(), Duration::from_millis(1));
    }

    #[test]
    fn test_shutdown_before_start_returns_immediately() {
        let simulator = FixedRateSimulator::new(
            Arc::new(SynchronizedEventBus::new()),
            Duration::from_millis(10),
        );
        simulator.shutdown();

        assert!(simulator.start().is_ok());
        assert_eq!(simulator.clock(), 0);
    }
}
