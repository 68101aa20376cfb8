//! One topic's partition of a [`super::PartitionedEventBus`].

use log::{error, info, warn};
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError, RwLock};
use std::thread::{self, Scope};
use std::time::Duration;

use super::{lock, read, write, Event, EventBus, EventTopic, Health, SharedReactor};
use crate::error::{SimulationError, SimulationResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Longest a publisher waits for room before overfilling the queue.
const PUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Queue length above which the topic reports itself degraded.
const DEGRADED_BACKLOG: usize = 16;

/// Bounded queue plus the reactors subscribed to one topic.
///
/// Dispatch hands reactors the parent bus so follow-ups are routed to
/// their own topic.
pub struct TopicBus {
    topic: EventTopic,
    capacity: usize,
    reactors: RwLock<Vec<SharedReactor>>,
    queue: Mutex<VecDeque<Event>>,
    not_empty: Condvar,
    not_full: Condvar,
    /// Loops currently draining the queue from other threads.
    consumers: AtomicUsize,
}

/// Counts a running consumer loop for as long as it lives.
struct ConsumerGuard<'a>(&'a AtomicUsize);

impl<'a> ConsumerGuard<'a> {
    fn enter(consumers: &'a AtomicUsize) -> Self {
        consumers.fetch_add(1, Ordering::AcqRel);
        Self(consumers)
    }
}

impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl TopicBus {
    pub fn new(topic: EventTopic, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            topic,
            capacity,
            reactors: RwLock::new(Vec::new()),
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            consumers: AtomicUsize::new(0),
        }
    }

    pub fn topic(&self) -> EventTopic {
        self.topic
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn attach(&self, reactor: SharedReactor) {
        write(&self.reactors).push(reactor);
    }

    pub fn num_reactors(&self) -> usize {
        read(&self.reactors).len()
    }

    pub fn backlog(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn health(&self) -> Health {
        let queued = self.backlog();
        if self.capacity.saturating_sub(queued) < self.capacity / 2 {
            Health::Critical
        } else if queued > DEGRADED_BACKLOG {
            Health::Degraded
        } else {
            Health::Good
        }
    }

    /// Number of `run`/`run_dynamic` loops serving this topic.
    pub fn consumers(&self) -> usize {
        self.consumers.load(Ordering::Acquire)
    }

    /// Enqueues an event, waiting while the queue is full.
    ///
    /// A publisher that waited [`PUSH_TIMEOUT`] without room pushes anyway;
    /// the only consumer may be the very thread that is publishing. Without
    /// running consumers (driven by `process`), a full queue just grows.
    pub fn push(&self, event: Event) {
        let mut queue = lock(&self.queue);
        if queue.len() >= self.capacity && self.consumers() > 0 {
            let (guard, timeout) = self
                .not_full
                .wait_timeout_while(queue, PUSH_TIMEOUT, |q| q.len() >= self.capacity)
                .unwrap_or_else(PoisonError::into_inner);
            queue = guard;
            if timeout.timed_out() {
                warn!(
                    "Topic {} over capacity ({} queued), accepting {} anyway",
                    self.topic,
                    queue.len(),
                    event.kind()
                );
            }
        }

        queue.push_back(event);
        drop(queue);
        self.not_empty.notify_one();
    }

    fn poll(&self, timeout: Duration) -> Option<Event> {
        let mut queue = lock(&self.queue);
        if queue.is_empty() {
            queue = self
                .not_empty
                .wait_timeout(queue, timeout)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        let event = queue.pop_front();
        if event.is_some() {
            self.not_full.notify_one();
        }
        event
    }

    fn try_pop(&self) -> Option<Event> {
        let event = lock(&self.queue).pop_front();
        if event.is_some() {
            self.not_full.notify_one();
        }
        event
    }

    fn dispatch(&self, bus: &dyn EventBus, event: &Event) {
        let mut reactors = read(&self.reactors).clone();
        reactors.shuffle(&mut rand::thread_rng());
        for reactor in reactors.iter() {
            reactor.on_event(bus, event);
        }
    }

    /// Dispatches up to `limit` queued events without waiting.
    pub fn process(&self, bus: &dyn EventBus, limit: usize) -> usize {
        let mut handled = 0;
        while handled < limit {
            let Some(event) = self.try_pop() else {
                break;
            };
            self.dispatch(bus, &event);
            handled += 1;
        }
        handled
    }

    /// Waits for events and dispatches them until `shutdown` is set.
    pub fn run(&self, bus: &dyn EventBus, shutdown: &AtomicBool) {
        let _consumer = ConsumerGuard::enter(&self.consumers);
        while !shutdown.load(Ordering::Acquire) {
            if let Some(event) = self.poll(POLL_INTERVAL) {
                self.dispatch(bus, &event);
            }
        }
    }

    /// Runs one event loop in the current thread, spawning overload workers
    /// on `scope` whenever the topic falls behind.
    pub fn run_dynamic<'scope, 'env>(
        &'env self,
        bus: &'env dyn EventBus,
        shutdown: &'env AtomicBool,
        scope: &'scope Scope<'scope, 'env>,
        strategy: &'env OverloadStrategy,
    ) -> SimulationResult<()> {
        let _consumer = ConsumerGuard::enter(&self.consumers);
        while !shutdown.load(Ordering::Acquire) {
            if let Some(event) = self.poll(POLL_INTERVAL) {
                strategy.apply(scope, self, bus, shutdown)?;
                self.dispatch(bus, &event);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Overload handling
// =============================================================================

/// Events an overload worker handles before retiring.
const WORK_LIMIT: usize = 4096;

/// Consecutive empty polls after which an overload worker retires.
const PAUSE_LIMIT: usize = 128;

/// Spawns short-lived helper workers for a topic that is not [`Health::Good`].
pub struct OverloadStrategy {
    max_workers: usize,
    concurrent_workers: AtomicUsize,
    worker_id: AtomicUsize,
}

impl OverloadStrategy {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            concurrent_workers: AtomicUsize::new(0),
            worker_id: AtomicUsize::new(0),
        }
    }

    pub fn active_workers(&self) -> usize {
        self.concurrent_workers.load(Ordering::Acquire)
    }

    pub fn apply<'scope, 'env>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        topic_bus: &'env TopicBus,
        bus: &'env dyn EventBus,
        shutdown: &'env AtomicBool,
    ) -> SimulationResult<()> {
        if topic_bus.health() != Health::Good && self.active_workers() < self.max_workers {
            self.spawn(scope, topic_bus, bus, shutdown)?;
        }
        Ok(())
    }

    fn spawn<'scope, 'env>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        topic_bus: &'env TopicBus,
        bus: &'env dyn EventBus,
        shutdown: &'env AtomicBool,
    ) -> SimulationResult<()> {
        let topic = topic_bus.topic();
        let me = (self.worker_id.fetch_add(1, Ordering::AcqRel) + 1) % 100;
        let pause = Duration::from_millis((me % self.max_workers) as u64);
        let active = self.concurrent_workers.fetch_add(1, Ordering::AcqRel) + 1;

        info!(
            "Topic bus for {} spawning worker #{} ({}/{}) to handle load",
            topic, me, active, self.max_workers
        );

        let name = format!("{:<6.6}-{:02}", topic.name(), me);
        let spawned = thread::Builder::new().name(name.clone()).spawn_scoped(scope, move || {
            let work = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut handled = 0;
                let mut pauses = 0;
                while handled < WORK_LIMIT && pauses < PAUSE_LIMIT && !shutdown.load(Ordering::Acquire) {
                    let last = topic_bus.process(bus, WORK_LIMIT);
                    if last > 0 {
                        pauses = 0;
                    }
                    handled += last;
                    pauses += 1;
                    thread::sleep(pause);
                }
                handled
            }));

            match work {
                Ok(handled) => info!(
                    "Worker #{} ({}/{}) for {} done processing {} events",
                    me,
                    self.active_workers(),
                    self.max_workers,
                    topic,
                    handled
                ),
                Err(_) => {
                    error!("Overload worker #{} for {} died. Shutting down", me, topic);
                    shutdown.store(true, Ordering::Release);
                }
            }
            self.concurrent_workers.fetch_sub(1, Ordering::AcqRel);
        });

        if let Err(source) = spawned {
            self.concurrent_workers.fetch_sub(1, Ordering::AcqRel);
            return Err(SimulationError::Spawn { name, source });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SynchronizedEventBus;
    use std::sync::Arc;

    #[test]
    fn test_health_thresholds() {
        let topic = TopicBus::new(EventTopic::Default, 64);
        assert_eq!(topic.health(), Health::Good);

        for i in 0..17 {
            topic.push(Event::tick(i));
        }
        assert_eq!(topic.health(), Health::Degraded);

        for i in 17..40 {
            topic.push(Event::tick(i));
        }
        assert_eq!(topic.health(), Health::Critical);
    }

    #[test]
    fn test_push_without_consumers_never_waits() {
        let topic = TopicBus::new(EventTopic::Scheduling, 2);
        let started = std::time::Instant::now();
        for i in 0..6 {
            topic.push(Event::tick(i));
        }

        assert!(started.elapsed() < PUSH_TIMEOUT);
        assert_eq!(topic.backlog(), 6);
        assert_eq!(topic.consumers(), 0);
    }

    #[test]
    fn test_run_counts_as_consumer() {
        let topic = TopicBus::new(EventTopic::Default, 4);
        let parent = SynchronizedEventBus::new();
        let shutdown = AtomicBool::new(false);

        thread::scope(|s| {
            s.spawn(|| topic.run(&parent, &shutdown));
            while topic.consumers() == 0 {
                thread::yield_now();
            }
            shutdown.store(true, Ordering::Release);
        });

        assert_eq!(topic.consumers(), 0);
    }

    #[test]
    fn test_process_dispatches_to_all_reactors() {
        let topic = TopicBus::new(EventTopic::Elevator, 8);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = counter.clone();
            topic.attach(Arc::new(move |_: &dyn EventBus, _: &Event| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        topic.push(Event::ElevatorIdle { elevator: 0, floor: 1 });
        topic.push(Event::ElevatorIdle { elevator: 1, floor: 2 });

        // Reactors only need some bus to reply to
        let parent = SynchronizedEventBus::new();
        assert_eq!(topic.process(&parent, 1), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(topic.process(&parent, usize::MAX), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 6);
        assert_eq!(topic.backlog(), 0);
    }

    #[test]
    fn test_overload_strategy_spawns_only_when_unhealthy() {
        let topic = TopicBus::new(EventTopic::Passenger, 4);
        let parent = SynchronizedEventBus::new();
        let shutdown = AtomicBool::new(false);
        let strategy = OverloadStrategy::new(2);

        thread::scope(|s| {
            strategy.apply(s, &topic, &parent, &shutdown).unwrap();
            assert_eq!(strategy.active_workers(), 0);

            for i in 0..3 {
                topic.push(Event::tick(i));
            }
            strategy.apply(s, &topic, &parent, &shutdown).unwrap();
            shutdown.store(true, Ordering::Release);
        });

        assert_eq!(strategy.active_workers(), 0);
    }
}
