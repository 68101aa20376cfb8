//! Elevator trajectories as immutable values.
//!
//! A [`Trajectory`] is the plan of one elevator: where it is now, which
//! turnpoints are left, and how long the current task still takes. Every
//! operation returns a new value, so schedulers can try out augmentations
//! on a snapshot without touching the elevator.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use super::splice::splice;

/// What an elevator does once its turnpoints run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "floor", rename_all = "lowercase")]
pub enum IdleBehavior {
    /// Wait on the last floor.
    Stay,
    /// Travel back to a home floor.
    Home(i32),
}

impl IdleBehavior {
    fn time_until_idle(self, trajectory: &Trajectory) -> i64 {
        match self {
            IdleBehavior::Stay => trajectory.time_left_on_task,
            IdleBehavior::Home(home) if trajectory.is_busy() => {
                trajectory.time_left_on_task + i64::from((trajectory.end_floor() - home).abs())
            }
            IdleBehavior::Home(home) => i64::from((trajectory.current_floor - home).abs()),
        }
    }

    fn next_step(self, trajectory: &Trajectory) -> i32 {
        match self {
            IdleBehavior::Stay => 0,
            IdleBehavior::Home(home) => (home - trajectory.current_floor).signum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trajectory {
    idle_behavior: IdleBehavior,
    current_time: i64,
    current_floor: i32,
    time_left_on_task: i64,
    turnpoints: VecDeque<i32>,
}

impl Trajectory {
    /// A trajectory that idles in place.
    pub fn new(current_time: i64, current_floor: i32) -> Self {
        Self::with_idle_behavior(IdleBehavior::Stay, current_time, current_floor)
    }

    /// A trajectory that returns to `home_floor` when idle.
    pub fn homing(home_floor: i32, current_time: i64, current_floor: i32) -> Self {
        Self::with_idle_behavior(IdleBehavior::Home(home_floor), current_time, current_floor)
    }

    pub fn with_idle_behavior(idle_behavior: IdleBehavior, current_time: i64, current_floor: i32) -> Self {
        Self {
            idle_behavior,
            current_time,
            current_floor,
            time_left_on_task: 0,
            turnpoints: VecDeque::new(),
        }
    }

    pub fn idle_behavior(&self) -> IdleBehavior {
        self.idle_behavior
    }

    pub fn current_time(&self) -> i64 {
        self.current_time
    }

    pub fn current_floor(&self) -> i32 {
        self.current_floor
    }

    /// Absolute time when the task is complete.
    pub fn end_time(&self) -> i64 {
        self.current_time + self.time_left_on_task
    }

    /// Relative time until the task is complete.
    pub fn time_left_on_task(&self) -> i64 {
        self.time_left_on_task
    }

    pub fn turnpoints(&self) -> Vec<i32> {
        self.turnpoints.iter().copied().collect()
    }

    pub fn end_floor(&self) -> i32 {
        self.turnpoints.back().copied().unwrap_or(self.current_floor)
    }

    pub fn is_busy(&self) -> bool {
        self.time_left_on_task > 0
    }

    pub fn time_until_idle(&self) -> i64 {
        self.idle_behavior.time_until_idle(self)
    }

    pub fn is_moving(&self) -> bool {
        self.time_until_idle() > 0
    }

    pub fn is_idle(&self) -> bool {
        !self.is_moving()
    }

    /// Whether the elevator should stop on the current floor.
    pub fn should_stop(&self) -> bool {
        self.turnpoints.front() == Some(&self.current_floor)
    }

    fn remaining_turnpoints(&self) -> VecDeque<i32> {
        let mut points = self.turnpoints.clone();
        while points.front() == Some(&self.current_floor) {
            points.pop_front();
        }
        points
    }

    pub fn next_floor(&self) -> i32 {
        match self.remaining_turnpoints().front() {
            Some(&next) => self.current_floor + (next - self.current_floor).signum(),
            None => self.current_floor + self.idle_behavior.next_step(self),
        }
    }

    /// Advances by one clock cycle.
    ///
    /// A turnpoint is only dropped once the elevator leaves it.
    pub fn step(&self) -> Self {
        let mut result = self.clone();
        result.turnpoints = self.remaining_turnpoints();
        result.current_floor = result.next_floor();
        result.current_time += 1;
        if result.time_left_on_task > 0 {
            result.time_left_on_task -= 1;
        }
        result
    }

    /// Blindly appends the segment `[start, end]` to the turnpoints.
    pub fn extend(&self, start: i32, end: i32) -> Self {
        let mut result = self.clone();
        let delta = (start - self.end_floor()).abs() + (end - start).abs();
        result.turnpoints.push_back(start);
        result.turnpoints.push_back(end);
        result.time_left_on_task += i64::from(delta);
        result
    }

    /// Inserts `[start, end]` into the existing turnpoints.
    ///
    /// Returns `None` when the segment does not overlap the current plan.
    pub fn insert_segment(&self, start: i32, end: i32) -> Option<Self> {
        if self.turnpoints.is_empty() {
            return None;
        }

        let points = splice(self.current_floor, &self.turnpoints, start, end, false)?;
        let mut result = self.clone();

        // Non-strict splicing may extend past the old last turnpoint
        if let (Some(&new_last), Some(&old_last)) = (points.back(), self.turnpoints.back()) {
            if new_last != old_last {
                result.time_left_on_task += i64::from((new_last - old_last).abs());
            }
        }
        result.turnpoints = points;
        Some(result)
    }

    /// Adds the directed segment `[start, end]`, inserting when possible and
    /// extending otherwise.
    pub fn augment(&self, start: i32, end: i32) -> Self {
        self.insert_segment(start, end)
            .unwrap_or_else(|| self.extend(start, end))
    }

    /// Like [`Trajectory::augment`], but refuses segments starting on the
    /// current floor.
    pub fn augment_opt(&self, start: i32, end: i32) -> Option<Self> {
        if start == self.current_floor {
            None
        } else {
            Some(self.augment(start, end))
        }
    }

    /// Whether `[start, end]` already lies on the plan at no extra cost.
    pub fn includes(&self, start: i32, end: i32) -> bool {
        self.insert_segment(start, end)
            .map(|t| t.time_left_on_task == self.time_left_on_task)
            .unwrap_or(false)
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trajectory{{t={}, floor={}, turnpoints={:?}}}",
            self.current_time, self.current_floor, self.turnpoints
        )
    }
}
