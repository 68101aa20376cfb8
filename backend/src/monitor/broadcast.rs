//! Fan-out of simulation events to async subscribers (SSE clients).

use tokio::sync::broadcast;

use crate::event::{Event, EventBus, EventReactor};

pub const DEFAULT_CAPACITY: usize = 256;

/// Reactor forwarding every event to a tokio broadcast channel.
///
/// Slow subscribers lose the oldest events rather than slowing the bus down.
pub struct EventBroadcaster {
    sender: broadcast::Sender<Event>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventReactor for EventBroadcaster {
    fn on_event(&self, _bus: &dyn EventBus, event: &Event) {
        // No receivers is fine
        let _ = self.sender.send(event.clone());
    }
}
