use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tandem_shared::pii::Masked;
use uuid::Uuid;

use crate::lifecycle::LifecycleError;

/// Booking status in the reservation lifecycle. `Pending` through
/// `Completed` is a strict linear chain; `Cancelled` and `Rejected` are the
/// only side exits. See `lifecycle.rs` for the transition table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    ComingForPickup,
    PickedUp,
    InTransit,
    DroppedOff,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::ComingForPickup => "COMING_FOR_PICKUP",
            BookingStatus::PickedUp => "PICKED_UP",
            BookingStatus::InTransit => "IN_TRANSIT",
            BookingStatus::DroppedOff => "DROPPED_OFF",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "COMING_FOR_PICKUP" => Some(BookingStatus::ComingForPickup),
            "PICKED_UP" => Some(BookingStatus::PickedUp),
            "IN_TRANSIT" => Some(BookingStatus::InTransit),
            "DROPPED_OFF" => Some(BookingStatus::DroppedOff),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "REJECTED" => Some(BookingStatus::Rejected),
            _ => None,
        }
    }

    /// The single forward step in the linear chain, if any.
    pub fn next_in_chain(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Pending => Some(BookingStatus::Confirmed),
            BookingStatus::Confirmed => Some(BookingStatus::ComingForPickup),
            BookingStatus::ComingForPickup => Some(BookingStatus::PickedUp),
            BookingStatus::PickedUp => Some(BookingStatus::InTransit),
            BookingStatus::InTransit => Some(BookingStatus::DroppedOff),
            BookingStatus::DroppedOff => Some(BookingStatus::Completed),
            BookingStatus::Completed
            | BookingStatus::Cancelled
            | BookingStatus::Rejected => None,
        }
    }

    /// Every status reachable in one transition: the chain successor plus
    /// the side exits available from this state.
    pub fn allowed_next(&self) -> Vec<BookingStatus> {
        let mut next = Vec::new();
        if let Some(step) = self.next_in_chain() {
            next.push(step);
        }
        match self {
            BookingStatus::Pending => {
                next.push(BookingStatus::Rejected);
                next.push(BookingStatus::Cancelled);
            }
            BookingStatus::Confirmed => next.push(BookingStatus::Cancelled),
            _ => {}
        }
        next
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Whether a booking in this status still occupies seats on the ride.
    pub fn occupies_seats(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Rejected)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    Passenger,
    Driver,
}

impl CancelledBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelledBy::Passenger => "PASSENGER",
            CancelledBy::Driver => "DRIVER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PASSENGER" => Some(CancelledBy::Passenger),
            "DRIVER" => Some(CancelledBy::Driver),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// One passenger's reservation against one ride. The fare is snapshotted at
/// creation from the ride's price at that instant and never recomputed, so a
/// later fare edit on the ride leaves existing bookings untouched. Bookings
/// are never deleted; cancellation and rejection are terminal statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub passenger_id: String,
    pub passenger_email: Option<Masked<String>>,
    pub seats_booked: i32,
    pub fare_per_seat: i64,
    pub total_fare: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_reason: Option<String>,
    pub payment_status: PaymentStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub coming_for_pickup_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub in_transit_at: Option<DateTime<Utc>>,
    pub dropped_off_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build a pending booking with the fare snapshotted from the ride's
    /// current per-seat price.
    pub fn new(
        ride_id: Uuid,
        passenger_id: String,
        passenger_email: Option<String>,
        seats_booked: i32,
        fare_per_seat: i64,
        currency: String,
        now: DateTime<Utc>,
    ) -> Result<Self, LifecycleError> {
        if seats_booked < 1 {
            return Err(LifecycleError::InvalidSeatCount {
                given: seats_booked,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            ride_id,
            passenger_id,
            passenger_email: passenger_email.map(Masked::new),
            seats_booked,
            fare_per_seat,
            total_fare: i64::from(seats_booked) * fare_per_seat,
            currency,
            status: BookingStatus::Pending,
            cancelled_by: None,
            cancellation_reason: None,
            payment_status: PaymentStatus::Pending,
            confirmed_at: None,
            coming_for_pickup_at: None,
            picked_up_at: None,
            in_transit_at: None,
            dropped_off_at: None,
            completed_at: None,
            cancelled_at: None,
            rejected_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fare_is_snapshotted_at_creation() {
        let booking = Booking::new(
            Uuid::new_v4(),
            "passenger-1".to_string(),
            None,
            3,
            2500,
            "USD".to_string(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(booking.total_fare, 7500);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn at_least_one_seat_is_required() {
        let result = Booking::new(
            Uuid::new_v4(),
            "passenger-1".to_string(),
            None,
            0,
            2500,
            "USD".to_string(),
            Utc::now(),
        );
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidSeatCount { given: 0 })
        ));
    }

    #[test]
    fn chain_walk_covers_all_forward_states() {
        let mut status = BookingStatus::Pending;
        let mut visited = vec![status];
        while let Some(next) = status.next_in_chain() {
            status = next;
            visited.push(status);
        }
        assert_eq!(
            visited,
            vec![
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::ComingForPickup,
                BookingStatus::PickedUp,
                BookingStatus::InTransit,
                BookingStatus::DroppedOff,
                BookingStatus::Completed,
            ]
        );
    }

    #[test]
    fn terminal_states_have_no_successors() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(!BookingStatus::DroppedOff.is_terminal());
    }

    #[test]
    fn cancelled_and_rejected_release_seat_occupancy() {
        assert!(!BookingStatus::Cancelled.occupies_seats());
        assert!(!BookingStatus::Rejected.occupies_seats());
        assert!(BookingStatus::Pending.occupies_seats());
        assert!(BookingStatus::Completed.occupies_seats());
    }
}
