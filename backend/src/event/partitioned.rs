//! Bus with one queue and worker pool per topic.

use log::{error, info};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use super::{
    Event, EventBus, EventTopic, Health, OverloadStrategy, RunnableEventBus, SharedReactor, TopicBus,
};
use crate::error::{SimulationError, SimulationResult};

pub const DEFAULT_QUEUE_DEPTH: usize = 1024;

/// Routes each event to the [`TopicBus`] of its topic.
///
/// A reactor attached to several topics sits in each of their reactor sets
/// and is invoked concurrently by their workers.
pub struct PartitionedEventBus {
    topics: Vec<TopicBus>,
    workers: HashMap<EventTopic, usize>,
}

impl PartitionedEventBus {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            topics: EventTopic::ALL
                .iter()
                .map(|&topic| TopicBus::new(topic, queue_depth))
                .collect(),
            workers: HashMap::new(),
        }
    }

    /// Sets how many workers serve `topic` (default 1).
    pub fn with_topic_workers(mut self, topic: EventTopic, workers: usize) -> Self {
        self.workers.insert(topic, workers.max(1));
        self
    }

    pub fn topic_workers(&self, topic: EventTopic) -> usize {
        self.workers.get(&topic).copied().unwrap_or(1)
    }

    pub fn topic_bus(&self, topic: EventTopic) -> &TopicBus {
        &self.topics[topic.index()]
    }
}

impl Default for PartitionedEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl EventBus for PartitionedEventBus {
    fn health(&self) -> Health {
        self.topics
            .iter()
            .map(TopicBus::health)
            .max()
            .unwrap_or(Health::Degraded)
    }

    fn attach_to(&self, topics: &[EventTopic], reactor: SharedReactor) {
        for &topic in topics {
            self.topic_bus(topic).attach(reactor.clone());
        }
    }

    fn fire_on(&self, topic: EventTopic, event: Event) {
        self.topic_bus(topic).push(event);
    }
}

impl RunnableEventBus for PartitionedEventBus {
    /// One pass over every topic, each handling up to `limit` events.
    fn process_limit(&self, limit: usize) -> usize {
        self.topics.iter().map(|topic| topic.process(self, limit)).sum()
    }

    fn run(&self, shutdown: &AtomicBool) -> SimulationResult<()> {
        let total: usize = EventTopic::ALL.iter().map(|&t| self.topic_workers(t)).sum();
        info!("Starting a total of {} workers", total);

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(total);
            for topic_bus in &self.topics {
                let topic = topic_bus.topic();
                for i in 0..self.topic_workers(topic) {
                    let name = format!("{:<6.6}-{:02}", topic.name(), i);
                    let handle = thread::Builder::new()
                        .name(name.clone())
                        .spawn_scoped(s, move || {
                            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                                topic_bus.run(self, shutdown)
                            }));
                            if outcome.is_err() {
                                error!("Topic thread died. Shutting down");
                                shutdown.store(true, Ordering::Release);
                            }
                            outcome.is_ok()
                        })
                        .map_err(|source| {
                            shutdown.store(true, Ordering::Release);
                            SimulationError::Spawn {
                                name: name.clone(),
                                source,
                            }
                        })?;
                    handles.push((name, handle));
                }
            }

            join_all(handles)
        })
    }

    /// One loop per topic, growing up to the topic's worker count under load.
    fn run_dynamic(&self, shutdown: &AtomicBool) -> SimulationResult<()> {
        let strategies: Vec<OverloadStrategy> = self
            .topics
            .iter()
            .map(|t| OverloadStrategy::new(self.topic_workers(t.topic())))
            .collect();

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.topics.len());
            for (topic_bus, strategy) in self.topics.iter().zip(&strategies) {
                let name = format!("{:<6.6}", topic_bus.topic().name());
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(s, move || {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                            topic_bus.run_dynamic(self, shutdown, s, strategy)
                        }));
                        match outcome {
                            Ok(Ok(())) => true,
                            Ok(Err(e)) => {
                                error!("Topic thread failed: {}. Shutting down", e);
                                shutdown.store(true, Ordering::Release);
                                false
                            }
                            Err(_) => {
                                error!("Topic thread died. Shutting down");
                                shutdown.store(true, Ordering::Release);
                                false
                            }
                        }
                    })
                    .map_err(|source| {
                        shutdown.store(true, Ordering::Release);
                        SimulationError::Spawn {
                            name: name.clone(),
                            source,
                        }
                    })?;
                handles.push((name, handle));
            }

            join_all(handles)
        })
    }

    fn backlog(&self) -> Option<usize> {
        Some(self.topics.iter().map(TopicBus::backlog).sum())
    }
}

fn join_all(handles: Vec<(String, thread::ScopedJoinHandle<'_, bool>)>) -> SimulationResult<()> {
    let mut first_failure = None;
    for (name, handle) in handles {
        let ok = handle.join().unwrap_or(false);
        if !ok && first_failure.is_none() {
            first_failure = Some(name);
        }
    }

    match first_failure {
        Some(name) => Err(SimulationError::WorkerDied(name)),
        None => Ok(()),
    }
}
