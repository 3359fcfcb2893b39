use crate::lifecycle::LifecycleError;
use crate::models::{Booking, BookingStatus, PaymentStatus};

/// What completing a booking does to the driver's running totals and the
/// booking's payment state. The store applies these in the same transaction
/// as the `DroppedOff → Completed` row update, whose status guard is what
/// makes the application exactly-once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEffects {
    pub ride_count_increment: i64,
    pub earnings_increment: i64,
    pub payment_status: PaymentStatus,
}

impl CompletionEffects {
    /// Effects of completing `booking`. Only a booking sitting at
    /// `DroppedOff` can settle; anything else is an invalid transition.
    pub fn for_booking(booking: &Booking) -> Result<Self, LifecycleError> {
        if booking.status != BookingStatus::DroppedOff {
            return Err(LifecycleError::invalid_transition(
                booking.status,
                BookingStatus::Completed,
            ));
        }

        Ok(Self {
            ride_count_increment: 1,
            earnings_increment: booking.total_fare,
            payment_status: PaymentStatus::Paid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn booking_at(status: BookingStatus) -> Booking {
        let mut booking = Booking::new(
            Uuid::new_v4(),
            "passenger-1".to_string(),
            None,
            2,
            4500,
            "USD".to_string(),
            Utc::now(),
        )
        .unwrap();
        booking.status = status;
        booking
    }

    #[test]
    fn settlement_pays_the_snapshotted_fare() {
        let booking = booking_at(BookingStatus::DroppedOff);
        let effects = CompletionEffects::for_booking(&booking).unwrap();
        assert_eq!(effects.ride_count_increment, 1);
        assert_eq!(effects.earnings_increment, 9000);
        assert_eq!(effects.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn settlement_requires_dropped_off() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InTransit,
            BookingStatus::Cancelled,
        ] {
            let booking = booking_at(status);
            assert!(CompletionEffects::for_booking(&booking).is_err());
        }
    }

    #[test]
    fn completed_booking_cannot_settle_again() {
        // A second completion request finds the booking already at
        // Completed and fails the transition check instead of double-paying.
        let booking = booking_at(BookingStatus::Completed);
        let err = CompletionEffects::for_booking(&booking).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }
}
