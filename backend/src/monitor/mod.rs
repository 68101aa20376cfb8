//! Observing a simulation from the outside.
//!
//! | Piece                 | Role                                         |
//! |-----------------------|----------------------------------------------|
//! | [`LoggingReactor`]    | logs every event                             |
//! | [`JournalWriter`]     | appends events to a JSON-lines journal       |
//! | [`JournalReader`]     | replays or follows a journal                 |
//! | [`EventBroadcaster`]  | forwards events to async subscribers (SSE)   |
//! | [`monitor`]           | replays a journal through logging + watchdog |

pub mod broadcast;
pub mod journal;

pub use broadcast::EventBroadcaster;
pub use journal::{JournalEntry, JournalReader, JournalWriter};

use log::{error, info};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::JournalResult;
use crate::event::{Event, EventBus, EventReactor, RunnableEventBus, SynchronizedEventBus};
use crate::simulation::WatchdogReactor;

/// Logs every event at info level.
#[derive(Debug, Default)]
pub struct LoggingReactor;

impl EventReactor for LoggingReactor {
    fn on_event(&self, _bus: &dyn EventBus, event: &Event) {
        info!("{{{}}} {}", event.kind(), event);
    }
}

/// Replays the journal at `path` through a receive-only bus with logging
/// and watchdog reactors attached.
///
/// With `follow`, keeps tailing the file until `shutdown` is set. Returns
/// the number of entries read.
pub fn monitor(path: impl AsRef<Path>, follow: bool, shutdown: &AtomicBool) -> JournalResult<usize> {
    let mut reader = JournalReader::open(path)?;

    let bus = SynchronizedEventBus::new();
    bus.attach(Arc::new(LoggingReactor));
    bus.attach(Arc::new(WatchdogReactor::new()));

    let done = AtomicBool::new(false);
    thread::scope(|s| {
        let runner = thread::Builder::new()
            .name("monitor".into())
            .spawn_scoped(s, || bus.run(&done))?;

        let result = if follow {
            reader.follow(&bus, shutdown)
        } else {
            reader.replay(&bus)
        };

        // Let the runner drain what was read before stopping it
        while bus.backlog().is_some_and(|n| n > 0) && !shutdown.load(Ordering::Acquire) {
            thread::yield_now();
        }
        done.store(true, Ordering::Release);

        match runner.join() {
            Ok(Err(e)) => error!("Monitor bus failed: {}", e),
            Err(_) => error!("Monitor bus died"),
            Ok(Ok(())) => {}
        }
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JournalError;

    #[test]
    fn test_monitor_replays_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let writer = JournalWriter::create(&path).unwrap();
        for t in 1..=5 {
            writer.append(&Event::tick(t)).unwrap();
        }

        let shutdown = AtomicBool::new(false);
        assert_eq!(monitor(&path, false, &shutdown).unwrap(), 5);
    }

    #[test]
    fn test_monitor_missing_file() {
        let shutdown = AtomicBool::new(false);
        let result = monitor("/nonexistent/journal.jsonl", false, &shutdown);
        assert!(matches!(result, Err(JournalError::IoError(_))));
    }
}
