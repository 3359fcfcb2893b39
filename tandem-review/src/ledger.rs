use chrono::{DateTime, Duration, Utc};
use tandem_booking::BookingStatus;

use crate::models::ReviewType;

/// Work out which side of the booking the reviewer is on. Returns the review
/// direction and the other party as reviewee.
pub fn determine_participant(
    reviewer_id: &str,
    passenger_id: &str,
    driver_id: &str,
) -> Result<(ReviewType, String), ReviewError> {
    if reviewer_id == passenger_id {
        Ok((ReviewType::PassengerToDriver, driver_id.to_string()))
    } else if reviewer_id == driver_id {
        Ok((ReviewType::DriverToPassenger, passenger_id.to_string()))
    } else {
        Err(ReviewError::NotParticipant)
    }
}

/// Gate for review creation: the booking must have completed and the
/// reviewer must be one of its two parties. Duplicate detection is the
/// store's job (unique index on booking + reviewer).
pub fn validate_creation(
    booking_status: BookingStatus,
    reviewer_id: &str,
    passenger_id: &str,
    driver_id: &str,
) -> Result<(ReviewType, String), ReviewError> {
    if booking_status != BookingStatus::Completed {
        return Err(ReviewError::NotCompleted {
            status: booking_status.as_str(),
        });
    }
    determine_participant(reviewer_id, passenger_id, driver_id)
}

/// Reviews stay editable/deletable by their author for a limited window
/// after creation.
pub fn within_edit_window(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window_hours: i64,
) -> bool {
    now - created_at <= Duration::hours(window_hours)
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("booking is not completed (status {status})")]
    NotCompleted { status: &'static str },

    #[error("reviewer is not a participant of this booking")]
    NotParticipant,

    #[error("a review by this reviewer already exists for this booking")]
    DuplicateReview,

    #[error("the edit window for this review has expired")]
    EditWindowExpired,

    #[error("only the original reviewer may modify a review")]
    NotReviewer,

    #[error("rating must be between 1 and 5, got {given}")]
    InvalidRating { given: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passenger_reviews_driver_and_vice_versa() {
        let (kind, reviewee) = determine_participant("p-1", "p-1", "d-1").unwrap();
        assert_eq!(kind, ReviewType::PassengerToDriver);
        assert_eq!(reviewee, "d-1");

        let (kind, reviewee) = determine_participant("d-1", "p-1", "d-1").unwrap();
        assert_eq!(kind, ReviewType::DriverToPassenger);
        assert_eq!(reviewee, "p-1");

        assert!(matches!(
            determine_participant("stranger", "p-1", "d-1"),
            Err(ReviewError::NotParticipant)
        ));
    }

    #[test]
    fn only_completed_bookings_are_reviewable() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::DroppedOff,
            BookingStatus::Cancelled,
            BookingStatus::Rejected,
        ] {
            assert!(matches!(
                validate_creation(status, "p-1", "p-1", "d-1"),
                Err(ReviewError::NotCompleted { .. })
            ));
        }
        assert!(validate_creation(BookingStatus::Completed, "p-1", "p-1", "d-1").is_ok());
    }

    #[test]
    fn edit_window_closes_after_configured_hours() {
        let created = Utc::now();
        assert!(within_edit_window(
            created,
            created + Duration::hours(23),
            24
        ));
        assert!(within_edit_window(
            created,
            created + Duration::hours(24),
            24
        ));
        assert!(!within_edit_window(
            created,
            created + Duration::hours(24) + Duration::seconds(1),
            24
        ));
    }
}
