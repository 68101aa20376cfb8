//! Bus and reactor traits.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::{Event, EventTopic, Health};
use crate::error::SimulationResult;

/// Something that reacts to published events.
///
/// Reactors are shared between worker threads, so they guard their own
/// state. Closures taking `(&dyn EventBus, &Event)` are reactors too.
pub trait EventReactor: Send + Sync {
    /// Reacts to an incoming event, possibly firing follow-ups on `bus`.
    fn on_event(&self, bus: &dyn EventBus, event: &Event);
}

impl<F> EventReactor for F
where
    F: Fn(&dyn EventBus, &Event) + Send + Sync,
{
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        self(bus, event)
    }
}

/// Reactor handle as stored by buses.
pub type SharedReactor = Arc<dyn EventReactor>;

/// Publish/subscribe surface shared by all buses.
pub trait EventBus: Send + Sync {
    fn health(&self) -> Health {
        Health::Good
    }

    /// Attaches a reactor so that events on any of `topics` reach it.
    fn attach_to(&self, topics: &[EventTopic], reactor: SharedReactor);

    /// Attaches a reactor to every topic.
    fn attach(&self, reactor: SharedReactor) {
        self.attach_to(&EventTopic::ALL, reactor)
    }

    /// Publishes `event` on `topic`. Each event has exactly one topic.
    fn fire_on(&self, topic: EventTopic, event: Event);

    /// Publishes `event` on [`EventTopic::Default`].
    fn fire(&self, event: Event) {
        self.fire_on(EventTopic::Default, event)
    }

    /// Publishes `event` on its natural topic (see [`Event::topic`]).
    fn publish(&self, event: Event) {
        let topic = event.topic();
        self.fire_on(topic, event)
    }
}

/// A bus that owns queues and can be driven, either step by step or by
/// worker threads.
pub trait RunnableEventBus: EventBus {
    /// Dispatches up to `limit` queued events and returns how many were handled.
    fn process_limit(&self, limit: usize) -> usize;

    /// Dispatches queued events, including follow-ups fired meanwhile.
    fn process(&self) -> usize {
        self.process_limit(usize::MAX)
    }

    /// Waits for new events and dispatches them until `shutdown` is set.
    fn run(&self, shutdown: &AtomicBool) -> SimulationResult<()>;

    /// Like [`RunnableEventBus::run`], but free to grow its worker pool under load.
    fn run_dynamic(&self, shutdown: &AtomicBool) -> SimulationResult<()> {
        self.run(shutdown)
    }

    /// Number of queued events, when the bus can tell.
    fn backlog(&self) -> Option<usize> {
        None
    }
}
