//! JSON-lines event journal.
//!
//! One line per event:
//!
//! ```text
//! {"at":"2024-05-01T12:00:00.123Z","event":{"type":"clockTick","value":42}}
//! ```
//!
//! [`JournalWriter`] is a reactor appending every event it sees;
//! [`JournalReader`] replays a journal into a bus, optionally following the
//! file while another process keeps writing to it.

use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::error::{JournalError, JournalResult};
use crate::event::{lock, Event, EventBus, EventReactor};

/// Longest pause between polls of a followed journal.
pub const MAX_FOLLOW_PAUSE: Duration = Duration::from_millis(100);

/// A journal line as read back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub event: Event,
}

#[derive(Serialize)]
struct JournalLine<'a> {
    at: DateTime<Utc>,
    event: &'a Event,
}

// =============================================================================
// Writer
// =============================================================================

/// Appends every event to a journal file.
pub struct JournalWriter {
    out: Mutex<BufWriter<File>>,
    written: AtomicU64,
}

impl JournalWriter {
    /// Opens `path` for appending, creating it if needed.
    pub fn create(path: impl AsRef<Path>) -> JournalResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: Mutex::new(BufWriter::new(file)),
            written: AtomicU64::new(0),
        })
    }

    /// Number of events written.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }

    pub fn append(&self, event: &Event) -> JournalResult<()> {
        let line = JournalLine {
            at: Utc::now(),
            event,
        };
        let written = self.written.load(Ordering::Acquire) as usize;
        let json = serde_json::to_string(&line).map_err(|source| JournalError::JsonError {
            line: written + 1,
            source,
        })?;

        let mut out = lock(&self.out);
        writeln!(out, "{}", json)?;
        // Followers only see complete lines
        out.flush()?;
        self.written.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl EventReactor for JournalWriter {
    fn on_event(&self, _bus: &dyn EventBus, event: &Event) {
        if let Err(e) = self.append(event) {
            error!("Failed to journal {}: {}", event.kind(), e);
        }
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Reads a journal line by line.
pub struct JournalReader {
    input: BufReader<File>,
    pending: String,
    line: usize,
}

impl JournalReader {
    pub fn open(path: impl AsRef<Path>) -> JournalResult<Self> {
        Ok(Self {
            input: BufReader::new(File::open(path)?),
            pending: String::new(),
            line: 0,
        })
    }

    /// Lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Next complete entry, or `None` at the current end of the file.
    ///
    /// A trailing line without newline is kept until the rest of it shows up.
    pub fn read_one(&mut self) -> JournalResult<Option<JournalEntry>> {
        loop {
            if self.input.read_line(&mut self.pending)? == 0 || !self.pending.ends_with('\n') {
                return Ok(None);
            }

            self.line += 1;
            let text = std::mem::take(&mut self.pending);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            return self.parse(text).map(Some);
        }
    }

    /// Entry on an unterminated last line, once the file is known complete.
    fn read_rest(&mut self) -> JournalResult<Option<JournalEntry>> {
        let text = std::mem::take(&mut self.pending);
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.line += 1;
        self.parse(text).map(Some)
    }

    fn parse(&self, text: &str) -> JournalResult<JournalEntry> {
        serde_json::from_str(text).map_err(|source| JournalError::JsonError {
            line: self.line,
            source,
        })
    }

    /// Publishes every remaining entry on `bus`, each on its natural topic.
    ///
    /// The file is taken as complete, so a last line without newline counts.
    pub fn replay(&mut self, bus: &dyn EventBus) -> JournalResult<usize> {
        let mut count = 0;
        while let Some(entry) = self.read_one()? {
            bus.publish(entry.event);
            count += 1;
        }
        if let Some(entry) = self.read_rest()? {
            bus.publish(entry.event);
            count += 1;
        }
        Ok(count)
    }

    /// Like [`JournalReader::replay`], but keeps polling the file for new
    /// entries until `shutdown` is set. Polling backs off up to
    /// [`MAX_FOLLOW_PAUSE`] while nothing arrives.
    pub fn follow(&mut self, bus: &dyn EventBus, shutdown: &AtomicBool) -> JournalResult<usize> {
        let mut count = 0;
        let mut pause = Duration::ZERO;
        while !shutdown.load(Ordering::Acquire) {
            match self.read_one()? {
                Some(entry) => {
                    bus.publish(entry.event);
                    count += 1;
                    pause = Duration::ZERO;
                }
                None => {
                    if pause.is_zero() {
                        thread::yield_now();
                        pause = Duration::from_millis(1);
                    } else {
                        thread::sleep(pause);
                        pause = (pause * 2).min(MAX_FOLLOW_PAUSE);
                    }
                }
            }
        }
        debug!("Stopped following journal after {} entries", count);
        Ok(count)
    }
}
