use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hard cap on posted seats; anything above a regular car/minivan is a data
/// entry mistake, not a real trip.
pub const MAX_SEATS_PER_RIDE: i32 = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
}

/// Ride status in the trip lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Scheduled => "SCHEDULED",
            RideStatus::InProgress => "IN_PROGRESS",
            RideStatus::Completed => "COMPLETED",
            RideStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(RideStatus::Scheduled),
            "IN_PROGRESS" => Some(RideStatus::InProgress),
            "COMPLETED" => Some(RideStatus::Completed),
            "CANCELLED" => Some(RideStatus::Cancelled),
            _ => None,
        }
    }

    /// Scheduled → InProgress → Completed, with Cancelled reachable from any
    /// non-terminal state.
    pub fn can_transition_to(&self, target: RideStatus) -> bool {
        matches!(
            (self, target),
            (RideStatus::Scheduled, RideStatus::InProgress)
                | (RideStatus::InProgress, RideStatus::Completed)
                | (RideStatus::Scheduled, RideStatus::Cancelled)
                | (RideStatus::InProgress, RideStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

/// A posted trip. `available_seats` is only ever mutated through the
/// inventory operations in `inventory.rs`, which keep
/// `0 <= available_seats <= total_seats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: String,
    pub origin: Location,
    pub destination: Location,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub fare_per_seat: i64,
    pub currency: String,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// Validate and build a new posting. Seats start fully available.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        driver_id: String,
        origin: Location,
        destination: Location,
        departure_time: DateTime<Utc>,
        total_seats: i32,
        fare_per_seat: i64,
        currency: String,
        now: DateTime<Utc>,
    ) -> Result<Self, RideError> {
        if total_seats < 1 || total_seats > MAX_SEATS_PER_RIDE {
            return Err(RideError::InvalidSeatCount { given: total_seats });
        }
        if fare_per_seat < 0 {
            return Err(RideError::NegativeFare { given: fare_per_seat });
        }
        if departure_time <= now {
            return Err(RideError::DepartureNotInFuture);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            driver_id,
            origin,
            destination,
            departure_time,
            total_seats,
            available_seats: total_seats,
            fare_per_seat,
            currency,
            status: RideStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a schedule/capacity edit. Only legal while no booking has gone
    /// past `Pending`; the caller enforces that. A capacity change must still
    /// cover seats already taken by active bookings.
    pub fn apply_update(
        &mut self,
        departure_time: Option<DateTime<Utc>>,
        total_seats: Option<i32>,
        fare_per_seat: Option<i64>,
        active_booked_seats: i32,
        now: DateTime<Utc>,
    ) -> Result<(), RideError> {
        if let Some(departure) = departure_time {
            if departure <= now {
                return Err(RideError::DepartureNotInFuture);
            }
            self.departure_time = departure;
        }
        if let Some(fare) = fare_per_seat {
            if fare < 0 {
                return Err(RideError::NegativeFare { given: fare });
            }
            self.fare_per_seat = fare;
        }
        if let Some(total) = total_seats {
            if total < 1 || total > MAX_SEATS_PER_RIDE {
                return Err(RideError::InvalidSeatCount { given: total });
            }
            if total < active_booked_seats {
                return Err(RideError::CapacityBelowBooked {
                    requested: total,
                    booked: active_booked_seats,
                });
            }
            self.total_seats = total;
            self.available_seats = total - active_booked_seats;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RideError {
    #[error("total seats must be between 1 and 8, got {given}")]
    InvalidSeatCount { given: i32 },

    #[error("fare per seat cannot be negative, got {given}")]
    NegativeFare { given: i64 },

    #[error("departure time must be in the future")]
    DepartureNotInFuture,

    #[error("new capacity {requested} is below the {booked} seats already booked")]
    CapacityBelowBooked { requested: i32, booked: i32 },

    #[error("ride status cannot change from {from} to {to}")]
    InvalidStatusChange { from: String, to: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn loc(city: &str) -> Location {
        Location {
            address: format!("1 {} St", city),
            city: city.to_string(),
            lat: 5.55,
            lng: -0.19,
        }
    }

    fn future_ride(total_seats: i32) -> Result<Ride, RideError> {
        let now = Utc::now();
        Ride::new(
            "driver-1".to_string(),
            loc("Accra"),
            loc("Kumasi"),
            now + Duration::hours(6),
            total_seats,
            2500,
            "USD".to_string(),
            now,
        )
    }

    #[test]
    fn new_ride_starts_fully_available() {
        let ride = future_ride(4).unwrap();
        assert_eq!(ride.available_seats, 4);
        assert_eq!(ride.status, RideStatus::Scheduled);
    }

    #[test]
    fn seat_count_is_bounded() {
        assert!(matches!(
            future_ride(0),
            Err(RideError::InvalidSeatCount { given: 0 })
        ));
        assert!(matches!(
            future_ride(9),
            Err(RideError::InvalidSeatCount { given: 9 })
        ));
        assert!(future_ride(8).is_ok());
    }

    #[test]
    fn departure_must_be_in_future() {
        let now = Utc::now();
        let result = Ride::new(
            "driver-1".to_string(),
            loc("Accra"),
            loc("Kumasi"),
            now - Duration::minutes(1),
            4,
            2500,
            "USD".to_string(),
            now,
        );
        assert!(matches!(result, Err(RideError::DepartureNotInFuture)));
    }

    #[test]
    fn capacity_edit_recomputes_availability() {
        let mut ride = future_ride(4).unwrap();
        // 3 seats already taken by pending bookings
        ride.apply_update(None, Some(6), None, 3, Utc::now()).unwrap();
        assert_eq!(ride.total_seats, 6);
        assert_eq!(ride.available_seats, 3);

        let result = ride.apply_update(None, Some(2), None, 3, Utc::now());
        assert!(matches!(result, Err(RideError::CapacityBelowBooked { .. })));
    }

    #[test]
    fn status_transitions_follow_trip_pipeline() {
        assert!(RideStatus::Scheduled.can_transition_to(RideStatus::InProgress));
        assert!(RideStatus::InProgress.can_transition_to(RideStatus::Completed));
        assert!(RideStatus::Scheduled.can_transition_to(RideStatus::Cancelled));
        assert!(RideStatus::InProgress.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Scheduled.can_transition_to(RideStatus::Completed));
        assert!(!RideStatus::Completed.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Cancelled.can_transition_to(RideStatus::Scheduled));
    }
}
