use crate::ride::{Ride, RideStatus};

/// Seat accounting for a ride. These are the only mutation paths for
/// `available_seats`; the persistence layer applies them while holding the
/// ride row lock so a check never races a competing decrement.
impl Ride {
    /// Take `n` seats out of availability. Legal only while the ride is
    /// still bookable and the seats actually exist.
    pub fn reserve_seats(&mut self, n: i32) -> Result<(), InventoryError> {
        if n < 1 {
            return Err(InventoryError::InvalidSeatRequest { requested: n });
        }
        if self.status != RideStatus::Scheduled {
            return Err(InventoryError::RideNotBookable {
                status: self.status.as_str(),
            });
        }
        if self.available_seats < n {
            return Err(InventoryError::InsufficientCapacity {
                requested: n,
                available: self.available_seats,
            });
        }

        self.available_seats -= n;
        Ok(())
    }

    /// Return `n` seats to availability after a rejection or cancellation.
    /// Callers must invoke this at most once per booking; the status guard on
    /// the booking row is what enforces that upstream.
    pub fn release_seats(&mut self, n: i32) -> Result<(), InventoryError> {
        if n < 1 {
            return Err(InventoryError::InvalidSeatRequest { requested: n });
        }
        if self.available_seats + n > self.total_seats {
            return Err(InventoryError::ReleaseOverflow {
                released: n,
                available: self.available_seats,
                total: self.total_seats,
            });
        }

        self.available_seats += n;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("seat count must be at least 1, got {requested}")]
    InvalidSeatRequest { requested: i32 },

    #[error("ride is not bookable in status {status}")]
    RideNotBookable { status: &'static str },

    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: i32, available: i32 },

    #[error("releasing {released} seats would exceed capacity ({available} available of {total})")]
    ReleaseOverflow {
        released: i32,
        available: i32,
        total: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ride::Location;
    use chrono::{Duration, Utc};

    fn ride_with_seats(total: i32) -> Ride {
        let now = Utc::now();
        Ride::new(
            "driver-1".to_string(),
            Location {
                address: "Main Terminal".to_string(),
                city: "Accra".to_string(),
                lat: 5.60,
                lng: -0.17,
            },
            Location {
                address: "Central Market".to_string(),
                city: "Kumasi".to_string(),
                lat: 6.69,
                lng: -1.62,
            },
            now + Duration::hours(12),
            total,
            3000,
            "USD".to_string(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn oversell_is_rejected_and_availability_unchanged() {
        let mut ride = ride_with_seats(4);

        // Passenger A takes 3 of 4 seats.
        ride.reserve_seats(3).unwrap();
        assert_eq!(ride.available_seats, 1);

        // Passenger B wants 2; only 1 left.
        let err = ride.reserve_seats(2).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientCapacity {
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(ride.available_seats, 1);

        // Rejecting A's booking restores the full pool.
        ride.release_seats(3).unwrap();
        assert_eq!(ride.available_seats, 4);
    }

    #[test]
    fn reservation_requires_scheduled_status() {
        let mut ride = ride_with_seats(4);
        ride.status = RideStatus::InProgress;
        assert!(matches!(
            ride.reserve_seats(1),
            Err(InventoryError::RideNotBookable { .. })
        ));
    }

    #[test]
    fn double_release_cannot_exceed_total() {
        let mut ride = ride_with_seats(4);
        ride.reserve_seats(2).unwrap();
        ride.release_seats(2).unwrap();
        let err = ride.release_seats(2).unwrap_err();
        assert!(matches!(err, InventoryError::ReleaseOverflow { .. }));
        assert_eq!(ride.available_seats, 4);
    }

    #[test]
    fn availability_stays_in_bounds_over_mixed_operations() {
        let mut ride = ride_with_seats(8);
        let ops: [(bool, i32); 7] = [
            (true, 3),
            (true, 4),
            (false, 4),
            (true, 2),
            (false, 3),
            (true, 8),
            (false, 2),
        ];
        for (reserve, n) in ops {
            let _ = if reserve {
                ride.reserve_seats(n)
            } else {
                ride.release_seats(n)
            };
            assert!(ride.available_seats >= 0);
            assert!(ride.available_seats <= ride.total_seats);
        }
    }

    #[test]
    fn zero_or_negative_requests_are_invalid() {
        let mut ride = ride_with_seats(4);
        assert!(matches!(
            ride.reserve_seats(0),
            Err(InventoryError::InvalidSeatRequest { requested: 0 })
        ));
        assert!(matches!(
            ride.release_seats(-1),
            Err(InventoryError::InvalidSeatRequest { requested: -1 })
        ));
    }
}
