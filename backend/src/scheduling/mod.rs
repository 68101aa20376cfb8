//! Assignment of waiting passengers to elevators.
//!
//! A scheduler reacts to [`Event::ScheduleRequest`] by firing an
//! [`Event::AssignRequest`] on the scheduling topic. The elevator then
//! accepts or rejects it; rejections and missed connections are fed back as
//! fresh schedule requests by [`RejectionReactor`] and
//! [`ReschedulingReactor`].
//!
//! | Scheduler                | Picks                                          |
//! |--------------------------|------------------------------------------------|
//! | [`RoundRobinScheduler`]  | the next elevator in turn                      |
//! | [`GreedyScheduler`]      | least time until idle, skipping elevators that |
//! |                          | sit on the pickup floor                        |
//! | [`FlockScheduler`]       | least time until idle                          |
//!
//! [`Event::ScheduleRequest`]: crate::event::Event::ScheduleRequest
//! [`Event::AssignRequest`]: crate::event::Event::AssignRequest

pub mod flock;
pub mod greedy;
pub mod rejection;
pub mod rescheduling;
pub mod round_robin;

pub use flock::FlockScheduler;
pub use greedy::GreedyScheduler;
pub use rejection::RejectionReactor;
pub use rescheduling::ReschedulingReactor;
pub use round_robin::RoundRobinScheduler;

use std::sync::{Arc, RwLock};

use crate::event::{read, write, EventReactor};
use crate::models::{Elevator, Trajectory};

/// A reactor that assigns schedule requests to elevators.
pub trait Scheduler: EventReactor {
    /// Hands over the elevators to choose from, indexed by id.
    fn set_elevators(&self, elevators: Vec<Arc<Elevator>>);
}

/// Elevators known to a scheduler.
#[derive(Default)]
pub(crate) struct Roster {
    elevators: RwLock<Vec<Arc<Elevator>>>,
}

impl Roster {
    pub fn set(&self, elevators: Vec<Arc<Elevator>>) {
        *write(&self.elevators) = elevators;
    }

    pub fn len(&self) -> usize {
        read(&self.elevators).len()
    }

    /// Current trajectories, in elevator order.
    pub fn trajectories(&self) -> Vec<Trajectory> {
        read(&self.elevators).iter().map(|e| e.trajectory()).collect()
    }
}

/// Index and value of the trajectory that becomes idle first.
///
/// Ties go to the lowest index.
pub(crate) fn soonest_idle(
    candidates: impl IntoIterator<Item = (usize, Trajectory)>,
) -> Option<(usize, Trajectory)> {
    candidates
        .into_iter()
        .min_by_key(|(_, trajectory)| trajectory.time_until_idle())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soonest_idle_prefers_lowest_index_on_ties() {
        let candidates = vec![
            (0, Trajectory::new(0, 0).extend(6, 5)),
            (1, Trajectory::new(0, 0).extend(4, 5)),
            (2, Trajectory::new(0, 0).extend(2, 5)),
        ];
        let best = soonest_idle(candidates).map(|(i, t)| (i, t.time_until_idle()));
        assert_eq!(best, Some((1, 5)));
        assert!(soonest_idle(Vec::new()).is_none());
    }

    #[test]
    fn test_roster_reads_live_trajectories() {
        let roster = Roster::default();
        assert_eq!(roster.len(), 0);

        let elevators = vec![
            Arc::new(Elevator::with_trajectory(0, 10, Trajectory::new(3, 4))),
            Arc::new(Elevator::new(1, 10)),
        ];
        roster.set(elevators);

        let floors: Vec<i32> = roster.trajectories().iter().map(Trajectory::current_floor).collect();
        assert_eq!(floors, vec![4, 0]);
    }
}
