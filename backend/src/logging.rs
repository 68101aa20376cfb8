//! Console logger for the `liftsim` binary.
//!
//! Library code logs through the `log` facade. The binary installs
//! [`ConsoleLogger`], which prints records to stderr and forwards them to
//! [`LOG_BROADCASTER`] for `/api/logs`. Stdout stays free for command output.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use crate::api::logs::{LogEntry, LOG_BROADCASTER};

/// Environment variable holding the log level (`error` .. `trace`).
pub const LOG_ENV: &str = "LIFTSIM_LOG";

pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Level from `LIFTSIM_LOG`, `info` when unset or invalid.
    pub fn level_from_env() -> LevelFilter {
        std::env::var(LOG_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(LevelFilter::Info)
    }

    /// Installs the logger globally. Fails if a logger is already set.
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::from_record(record);
        let thread = std::thread::current();
        eprintln!(
            "{} {:<5} [{}] {}",
            entry.at.format("%H:%M:%S%.3f"),
            record.level(),
            thread.name().unwrap_or(record.target()),
            entry.message
        );
        LOG_BROADCASTER.publish(entry);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
