//! Single-queue bus that broadcasts every event to every reactor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError, RwLock};
use std::time::Duration;

use super::{lock, read, write, Event, EventBus, EventTopic, RunnableEventBus, SharedReactor};
use crate::error::SimulationResult;

/// How long `run` waits for an event before re-checking the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Unbounded FIFO bus; topics are recorded but not used for routing.
///
/// Reactors fired from within a dispatch are queued behind the current
/// backlog, so `process` keeps going until those follow-ups are handled too.
#[derive(Default)]
pub struct SynchronizedEventBus {
    reactors: RwLock<Vec<SharedReactor>>,
    queue: Mutex<VecDeque<(EventTopic, Event)>>,
    ready: Condvar,
}

impl SynchronizedEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_reactors(&self) -> usize {
        read(&self.reactors).len()
    }

    fn poll(&self, timeout: Duration) -> Option<(EventTopic, Event)> {
        let mut queue = lock(&self.queue);
        if let Some(item) = queue.pop_front() {
            return Some(item);
        }

        let (mut queue, _) = self
            .ready
            .wait_timeout(queue, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        queue.pop_front()
    }

    fn dispatch(&self, event: &Event) {
        let reactors = read(&self.reactors).clone();
        for reactor in reactors.iter() {
            reactor.on_event(self, event);
        }
    }
}

impl EventBus for SynchronizedEventBus {
    fn attach_to(&self, _topics: &[EventTopic], reactor: SharedReactor) {
        write(&self.reactors).push(reactor);
    }

    /// Enqueues the event for a later `process` or a concurrent `run`.
    fn fire_on(&self, topic: EventTopic, event: Event) {
        lock(&self.queue).push_back((topic, event));
        self.ready.notify_one();
    }
}

impl RunnableEventBus for SynchronizedEventBus {
    fn process_limit(&self, limit: usize) -> usize {
        let mut handled = 0;
        while handled < limit {
            let next = lock(&self.queue).pop_front();
            let Some((_, event)) = next else {
                break;
            };

            self.dispatch(&event);
            handled += 1;
        }

        handled
    }

    fn run(&self, shutdown: &AtomicBool) -> SimulationResult<()> {
        while !shutdown.load(Ordering::Acquire) {
            if let Some((_, event)) = self.poll(POLL_INTERVAL) {
                self.dispatch(&event);
            }
        }

        Ok(())
    }

    fn backlog(&self) -> Option<usize> {
        Some(lock(&self.queue).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<Event>>>, SharedReactor) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reactor: SharedReactor = Arc::new(move |_: &dyn EventBus, event: &Event| {
            sink.lock().unwrap().push(event.clone());
        });
        (seen, reactor)
    }

    #[test]
    fn test_unprocessed_events_are_not_delivered() {
        let bus = SynchronizedEventBus::new();
        let (seen, reactor) = recorder();
        bus.attach(reactor);

        bus.fire(Event::tick(0));
        bus.fire(Event::ElevatorIdle { elevator: 0, floor: 0 });
        assert_eq!(bus.process(), 2);

        bus.fire(Event::tick(1));
        bus.process();

        // Fired but never processed
        bus.fire(Event::tick(2));
        bus.fire(Event::ElevatorIdle { elevator: 0, floor: 9 });

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Event::tick(0),
                Event::ElevatorIdle { elevator: 0, floor: 0 },
                Event::tick(1),
            ]
        );
        assert_eq!(bus.backlog(), Some(2));
    }

    #[test]
    fn test_process_handles_follow_ups() {
        let bus = SynchronizedEventBus::new();
        let (seen, recorder) = recorder();
        bus.attach(Arc::new(|bus: &dyn EventBus, event: &Event| {
            if let Event::ClockTick { value } = event {
                if *value < 3 {
                    bus.fire(Event::tick(value + 1));
                }
            }
        }));
        bus.attach(recorder);

        bus.fire(Event::tick(0));
        assert_eq!(bus.process(), 4);
        assert_eq!(seen.lock().unwrap().len(), 4);
        assert_eq!(bus.num_reactors(), 2);
    }

    #[test]
    fn test_process_limit() {
        let bus = SynchronizedEventBus::new();
        for i in 0..5 {
            bus.fire(Event::tick(i));
        }
        assert_eq!(bus.process_limit(3), 3);
        assert_eq!(bus.backlog(), Some(2));
    }

    #[test]
    fn test_run_exits_on_shutdown() {
        let bus = Arc::new(SynchronizedEventBus::new());
        let (seen, reactor) = recorder();
        bus.attach(reactor);
        let shutdown = Arc::new(AtomicBool::new(false));

        let runner = {
            let bus = bus.clone();
            let shutdown = shutdown.clone();
            std::thread::spawn(move || bus.run(&shutdown))
        };

        bus.fire(Event::tick(1));
        std::thread::sleep(Duration::from_millis(200));
        shutdown.store(true, Ordering::Release);

        assert!(runner.join().unwrap().is_ok());
        assert_eq!(*seen.lock().unwrap(), vec![Event::tick(1)]);
    }
}
