//! Events held back until a given clock tick.

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use super::{lock, Event, EventBus, EventReactor, EventTopic};
use crate::error::QueueError;

/// Defers events to fire at predetermined clock ticks.
///
/// Used for offline simulations and scripted request schedules. Attach it
/// to the bus that carries the clock ticks.
#[derive(Default)]
pub struct DeferredEventQueue {
    clock: AtomicI64,
    sequence: AtomicU64,
    events: Mutex<BinaryHeap<Reverse<DeferredEvent>>>,
}

struct DeferredEvent {
    time: i64,
    id: u64,
    topic: EventTopic,
    event: Event,
}

impl PartialEq for DeferredEvent {
    fn eq(&self, other: &Self) -> bool {
        (self.time, self.id) == (other.time, other.id)
    }
}

impl Eq for DeferredEvent {}

impl PartialOrd for DeferredEvent {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeferredEvent {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.time, self.id).cmp(&(other.time, other.id))
    }
}

impl DeferredEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last clock tick seen.
    pub fn clock(&self) -> i64 {
        self.clock.load(Ordering::Acquire)
    }

    /// Defers `event` on the default topic.
    pub fn schedule_at(&self, time: i64, event: Event) -> Result<(), QueueError> {
        self.schedule_at_on(time, EventTopic::Default, event)
    }

    /// Defers `event` until the tick `time`; events for the same tick keep
    /// their scheduling order.
    pub fn schedule_at_on(&self, time: i64, topic: EventTopic, event: Event) -> Result<(), QueueError> {
        let clock = self.clock();
        if time < clock {
            return Err(QueueError::InThePast { at: time, clock });
        }

        let id = self.sequence.fetch_add(1, Ordering::AcqRel);
        lock(&self.events).push(Reverse(DeferredEvent {
            time,
            id,
            topic,
            event,
        }));
        Ok(())
    }

    /// Whether events are still pending.
    pub fn is_active(&self) -> bool {
        !lock(&self.events).is_empty()
    }

    pub fn pending(&self) -> usize {
        lock(&self.events).len()
    }
}

impl EventReactor for DeferredEventQueue {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        let Event::ClockTick { value } = event else {
            return;
        };

        let due = {
            let mut events = lock(&self.events);
            self.clock.store(*value, Ordering::Release);

            let mut due = Vec::new();
            while events.peek().is_some_and(|next| next.0.time <= *value) {
                if let Some(Reverse(deferred)) = events.pop() {
                    due.push(deferred);
                }
            }
            due
        };

        for deferred in due {
            bus.fire_on(deferred.topic, deferred.event);
        }
    }
}
