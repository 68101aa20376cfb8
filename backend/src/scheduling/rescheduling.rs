use log::info;

use crate::event::{Event, EventBus, EventReactor, EventTopic};

/// Schedules passengers again after their elevator left without them.
#[derive(Debug, Default)]
pub struct ReschedulingReactor;

impl EventReactor for ReschedulingReactor {
    fn on_event(&self, bus: &dyn EventBus, event: &Event) {
        let Event::MissedConnection {
            floor, passenger, ..
        } = event
        else {
            return;
        };

        info!("{} missed its elevator at floor {}", passenger, floor);
        bus.fire_on(
            EventTopic::Scheduling,
            Event::ScheduleRequest {
                passenger: passenger.clone(),
                floor: *floor,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingBus;
    use crate::models::Passenger;

    #[test]
    fn test_missed_connection_is_rescheduled() {
        let bus = RecordingBus::default();
        let passenger = Passenger::new(0);

        ReschedulingReactor.on_event(
            &bus,
            &Event::MissedConnection {
                floor: 6,
                elevator: 1,
                passenger: passenger.clone(),
            },
        );

        assert_eq!(
            bus.events(),
            vec![(
                EventTopic::Scheduling,
                Event::ScheduleRequest {
                    passenger,
                    floor: 6
                }
            )]
        );
    }
}
