use log::warn;

use crate::event::{Event, EventBus, EventReactor, EventTopic};

/// Retries rejected assignments by scheduling them again.
#[derive(Debug, Default)]
pub struct RejectionReactor;

impl EventReactor for RejectionReactor {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        let Event::RequestRejected(request) = event else {
            return;
        };

        warn!("Assignment rejected: {}. Retrying", request);
        bus.fire_on(
            EventTopic::Scheduling,
            Event::ScheduleRequest {
                passenger: request.passenger.clone(),
                floor: request.floor,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AssignRequest, RecordingBus};
    use crate::models::Passenger;

    #[test]
    fn test_rejection_is_rescheduled() {
        let bus = RecordingBus::default();
        let passenger = Passenger::new(3);
        let request = AssignRequest::new(passenger.clone(), 7, 2).with_timing(4, 14);

        RejectionReactor.on_event(&bus, &Event::RequestAccepted(request.clone()));
        assert!(bus.events().is_empty());

        RejectionReactor.on_event(&bus, &Event::RequestRejected(request));
        assert_eq!(
            bus.events(),
            vec![(
                EventTopic::Scheduling,
                Event::ScheduleRequest {
                    passenger,
                    floor: 7
                }
            )]
        );
    }
}
