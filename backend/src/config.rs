//! Simulation configuration.
//!
//! Loaded from a JSON file; every field has a default, so `{}` is a valid
//! config. Without `--config`, the file named by `LIFTSIM_CONFIG` is used
//! (`.env` files are honoured), else the defaults.
//!
//! ```json
//! {
//!   "floors": 30,
//!   "elevators": 5,
//!   "homeFloors": [0, 7, 14, 21, 28],
//!   "tickMs": 1000,
//!   "scheduler": "flock",
//!   "bus": "partitioned",
//!   "queueDepth": 1024,
//!   "topicWorkers": { "passenger": 2 }
//! }
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::event::{
    DeferredEventQueue, EventTopic, PartitionedEventBus, RunnableEventBus, SynchronizedEventBus,
};
use crate::models::{Building, BuildingBuilder, ElevatorFactory};
use crate::scheduling::{FlockScheduler, GreedyScheduler, RoundRobinScheduler};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LIFTSIM_CONFIG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulerKind {
    RoundRobin,
    Greedy,
    #[default]
    Flock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusKind {
    Synchronized,
    #[default]
    Partitioned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub floors: usize,
    pub elevators: usize,
    /// One home floor per elevator; elevators stay put when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_floors: Option<Vec<i32>>,
    /// Clock period of the fixed-rate simulator.
    pub tick_ms: u64,
    pub scheduler: SchedulerKind,
    pub bus: BusKind,
    /// Capacity of each topic queue of the partitioned bus.
    pub queue_depth: usize,
    /// Maximum workers per topic of the partitioned bus (default 1).
    pub topic_workers: BTreeMap<EventTopic, usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            floors: 30,
            elevators: 5,
            home_floors: None,
            tick_ms: 1000,
            scheduler: SchedulerKind::default(),
            bus: BusKind::default(),
            queue_depth: crate::event::partitioned::DEFAULT_QUEUE_DEPTH,
            topic_workers: BTreeMap::new(),
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

impl SimulationConfig {
    /// Reads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Loads `path` if given, else the file named by `LIFTSIM_CONFIG`, else
    /// the defaults.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.floors < 2 {
            return Err(invalid("floors", "a building needs at least 2 floors"));
        }
        if i32::try_from(self.floors).is_err() {
            return Err(invalid("floors", format!("at most {} floors", i32::MAX)));
        }
        if self.elevators == 0 {
            return Err(invalid("elevators", "must be positive"));
        }
        if self.tick_ms == 0 {
            return Err(invalid("tickMs", "must be positive"));
        }
        if self.queue_depth == 0 {
            return Err(invalid("queueDepth", "must be positive"));
        }
        if let Some((topic, _)) = self.topic_workers.iter().find(|(_, &n)| n == 0) {
            return Err(invalid("topicWorkers", format!("{} needs at least one worker", topic)));
        }

        if let Some(homes) = &self.home_floors {
            if homes.len() < self.elevators {
                return Err(invalid(
                    "homeFloors",
                    format!("expected {} entries, got {}", self.elevators, homes.len()),
                ));
            }
            if let Some(h) = homes.iter().find(|&&h| h < 0 || h as usize >= self.floors) {
                return Err(invalid(
                    "homeFloors",
                    format!("floor {} is outside 0..{}", h, self.floors),
                ));
            }
        }
        Ok(())
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn elevator_factory(&self) -> ElevatorFactory {
        match &self.home_floors {
            Some(homes) => ElevatorFactory::Homing(homes.clone()),
            None => ElevatorFactory::Standard,
        }
    }

    pub fn event_bus(&self) -> Arc<dyn RunnableEventBus> {
        match self.bus {
            BusKind::Synchronized => Arc::new(SynchronizedEventBus::new()),
            BusKind::Partitioned => {
                let bus = self
                    .topic_workers
                    .iter()
                    .fold(PartitionedEventBus::new(self.queue_depth), |bus, (&topic, &n)| {
                        bus.with_topic_workers(topic, n)
                    });
                Arc::new(bus)
            }
        }
    }

    /// A builder with everything but extra reactors set up.
    pub fn building_builder(&self) -> BuildingBuilder {
        let builder = Building::builder()
            .floors(self.floors)
            .elevators(self.elevators)
            .event_bus(self.event_bus())
            .event_queue(Arc::new(DeferredEventQueue::new()))
            .elevator_factory(self.elevator_factory());

        match self.scheduler {
            SchedulerKind::RoundRobin => builder.scheduler(Arc::new(RoundRobinScheduler::new())),
            SchedulerKind::Greedy => builder.scheduler(Arc::new(GreedyScheduler::new())),
            SchedulerKind::Flock => builder.scheduler(Arc::new(FlockScheduler::new())),
        }
    }
}
