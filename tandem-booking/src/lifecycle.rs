use tandem_ride::{Ride, RideStatus};

use crate::models::BookingStatus;

/// Who is driving a transition. `System` is reserved for ride-level cascade
/// cancellation, which overrides the passenger-only rule on individual
/// cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Passenger,
    Driver,
    System,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::Passenger => "passenger",
            Actor::Driver => "driver",
            Actor::System => "system",
        }
    }
}

/// Check a requested transition against the table. Non-adjacent or backward
/// targets fail with the current status and its allowed-next set.
pub fn validate_transition(
    current: BookingStatus,
    target: BookingStatus,
) -> Result<(), LifecycleError> {
    if current.allowed_next().contains(&target) {
        Ok(())
    } else {
        Err(LifecycleError::invalid_transition(current, target))
    }
}

/// Check adjacency and that the acting party owns the edge:
/// - respond (`Pending → Confirmed | Rejected`): ride's driver only
/// - cancel (`Pending | Confirmed → Cancelled`): booking's passenger, or the
///   system during a ride cascade
/// - progress (`Confirmed → … → Completed`): ride's driver only
pub fn authorize_transition(
    actor: Actor,
    current: BookingStatus,
    target: BookingStatus,
) -> Result<(), LifecycleError> {
    validate_transition(current, target)?;

    let permitted = match target {
        BookingStatus::Confirmed if current == BookingStatus::Pending => actor == Actor::Driver,
        BookingStatus::Rejected => actor == Actor::Driver,
        BookingStatus::Cancelled => matches!(actor, Actor::Passenger | Actor::System),
        // Remaining edges are the forward chain, owned by the driver.
        _ => actor == Actor::Driver,
    };

    if permitted {
        Ok(())
    } else {
        Err(LifecycleError::ForbiddenActor {
            actor: actor.as_str(),
            from: current,
            to: target,
        })
    }
}

/// Creation preconditions that do not touch seat counts: the requester must
/// not be the ride's driver and must not already hold a live booking on the
/// ride. Capacity and bookability are checked by the seat reservation itself.
pub fn validate_creation(
    ride: &Ride,
    passenger_id: &str,
    already_booked: bool,
) -> Result<(), LifecycleError> {
    if ride.driver_id == passenger_id {
        return Err(LifecycleError::OwnRide);
    }
    if already_booked {
        return Err(LifecycleError::AlreadyBooked);
    }
    if ride.status != RideStatus::Scheduled {
        return Err(LifecycleError::RideNotOpen {
            status: ride.status.as_str(),
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("invalid transition from {from} to {to} (allowed: {allowed})")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
        allowed: String,
    },

    #[error("{actor} may not move a booking from {} to {}", .from.as_str(), .to.as_str())]
    ForbiddenActor {
        actor: &'static str,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("drivers cannot book seats on their own ride")]
    OwnRide,

    #[error("passenger already has a live booking on this ride")]
    AlreadyBooked,

    #[error("ride is not open for booking in status {status}")]
    RideNotOpen { status: &'static str },

    #[error("seats booked must be at least 1, got {given}")]
    InvalidSeatCount { given: i32 },
}

impl LifecycleError {
    pub fn invalid_transition(from: BookingStatus, to: BookingStatus) -> Self {
        let allowed = from
            .allowed_next()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let allowed = if allowed.is_empty() {
            "none".to_string()
        } else {
            allowed
        };
        LifecycleError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
            allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tandem_ride::Location;

    fn sample_ride() -> Ride {
        let now = Utc::now();
        Ride::new(
            "driver-1".to_string(),
            Location {
                address: "A".to_string(),
                city: "Accra".to_string(),
                lat: 0.0,
                lng: 0.0,
            },
            Location {
                address: "B".to_string(),
                city: "Kumasi".to_string(),
                lat: 1.0,
                lng: 1.0,
            },
            now + Duration::hours(3),
            4,
            1000,
            "USD".to_string(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn forward_chain_is_adjacent_only() {
        let chain = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::ComingForPickup,
            BookingStatus::PickedUp,
            BookingStatus::InTransit,
            BookingStatus::DroppedOff,
            BookingStatus::Completed,
        ];
        for pair in chain.windows(2) {
            assert!(validate_transition(pair[0], pair[1]).is_ok());
        }
        // Skipping a state is never legal.
        assert!(validate_transition(BookingStatus::Confirmed, BookingStatus::PickedUp).is_err());
        assert!(validate_transition(BookingStatus::Pending, BookingStatus::Completed).is_err());
        // Backward moves are never legal.
        assert!(validate_transition(BookingStatus::InTransit, BookingStatus::PickedUp).is_err());
    }

    #[test]
    fn invalid_transition_reports_allowed_set() {
        let err =
            validate_transition(BookingStatus::Confirmed, BookingStatus::PickedUp).unwrap_err();
        match err {
            LifecycleError::InvalidTransition { from, to, allowed } => {
                assert_eq!(from, "CONFIRMED");
                assert_eq!(to, "PICKED_UP");
                assert!(allowed.contains("COMING_FOR_PICKUP"));
                assert!(allowed.contains("CANCELLED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for terminal in [
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Rejected,
        ] {
            for target in [
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ] {
                assert!(validate_transition(terminal, target).is_err());
            }
        }
    }

    #[test]
    fn respond_is_driver_only() {
        assert!(
            authorize_transition(Actor::Driver, BookingStatus::Pending, BookingStatus::Confirmed)
                .is_ok()
        );
        assert!(
            authorize_transition(Actor::Driver, BookingStatus::Pending, BookingStatus::Rejected)
                .is_ok()
        );
        assert!(authorize_transition(
            Actor::Passenger,
            BookingStatus::Pending,
            BookingStatus::Confirmed
        )
        .is_err());
    }

    #[test]
    fn cancel_is_passenger_or_system() {
        assert!(authorize_transition(
            Actor::Passenger,
            BookingStatus::Pending,
            BookingStatus::Cancelled
        )
        .is_ok());
        assert!(authorize_transition(
            Actor::Passenger,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled
        )
        .is_ok());
        // Ride-level cascade bypasses the passenger-only rule.
        assert!(authorize_transition(
            Actor::System,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled
        )
        .is_ok());
        assert!(authorize_transition(
            Actor::Driver,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled
        )
        .is_err());
        // No cancel once the trip has started.
        assert!(authorize_transition(
            Actor::Passenger,
            BookingStatus::PickedUp,
            BookingStatus::Cancelled
        )
        .is_err());
    }

    #[test]
    fn progress_is_driver_only() {
        assert!(authorize_transition(
            Actor::Driver,
            BookingStatus::Confirmed,
            BookingStatus::ComingForPickup
        )
        .is_ok());
        assert!(authorize_transition(
            Actor::Passenger,
            BookingStatus::DroppedOff,
            BookingStatus::Completed
        )
        .is_err());
    }

    #[test]
    fn drivers_cannot_book_their_own_ride() {
        let ride = sample_ride();
        assert!(matches!(
            validate_creation(&ride, "driver-1", false),
            Err(LifecycleError::OwnRide)
        ));
    }

    #[test]
    fn one_live_booking_per_passenger_per_ride() {
        let ride = sample_ride();
        assert!(validate_creation(&ride, "passenger-1", false).is_ok());
        assert!(matches!(
            validate_creation(&ride, "passenger-1", true),
            Err(LifecycleError::AlreadyBooked)
        ));
    }

    #[test]
    fn creation_requires_open_ride() {
        let mut ride = sample_ride();
        ride.status = RideStatus::Cancelled;
        assert!(matches!(
            validate_creation(&ride, "passenger-1", false),
            Err(LifecycleError::RideNotOpen { .. })
        ));
    }
}
