//! Row structs for type-safe querying, converted into domain types at the
//! repository boundary. A status string the domain cannot parse means the
//! row was written by something newer than this binary; it surfaces as an
//! internal fault, never a panic.

use chrono::{DateTime, Utc};
use tandem_booking::{Booking, BookingStatus, CancelledBy, PaymentStatus};
use tandem_core::driver::DriverProfile;
use tandem_core::CoreError;
use tandem_review::{AspectRatings, Review, ReviewType};
use tandem_ride::{Location, Ride, RideStatus};
use tandem_shared::pii::Masked;
use uuid::Uuid;

pub(crate) const RIDE_COLUMNS: &str = "id, driver_id, origin_address, origin_city, origin_lat, origin_lng, \
     destination_address, destination_city, destination_lat, destination_lng, \
     departure_time, total_seats, available_seats, fare_per_seat, currency, status, \
     created_at, updated_at";

pub(crate) const BOOKING_COLUMNS: &str = "id, ride_id, passenger_id, passenger_email, seats_booked, fare_per_seat, \
     total_fare, currency, status, cancelled_by, cancellation_reason, payment_status, \
     confirmed_at, coming_for_pickup_at, picked_up_at, in_transit_at, dropped_off_at, \
     completed_at, cancelled_at, rejected_at, created_at, updated_at";

pub(crate) const REVIEW_COLUMNS: &str = "id, booking_id, ride_id, reviewer_id, reviewee_id, review_type, rating, \
     comment, aspects, is_visible, created_at, updated_at";

pub(crate) const PROFILE_COLUMNS: &str = "driver_id, contact_email, is_approved, total_rides, total_earnings, \
     rating, rating_count, created_at, updated_at";

fn corrupt(column: &str, value: &str) -> CoreError {
    CoreError::Internal(format!("unrecognized {} value in database: {}", column, value))
}

#[derive(sqlx::FromRow)]
pub(crate) struct RideRow {
    pub id: Uuid,
    pub driver_id: String,
    pub origin_address: String,
    pub origin_city: String,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub destination_address: String,
    pub destination_city: String,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub fare_per_seat: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideRow {
    pub fn into_ride(self) -> Result<Ride, CoreError> {
        let status =
            RideStatus::parse(&self.status).ok_or_else(|| corrupt("ride status", &self.status))?;
        Ok(Ride {
            id: self.id,
            driver_id: self.driver_id,
            origin: Location {
                address: self.origin_address,
                city: self.origin_city,
                lat: self.origin_lat,
                lng: self.origin_lng,
            },
            destination: Location {
                address: self.destination_address,
                city: self.destination_city,
                lat: self.destination_lat,
                lng: self.destination_lng,
            },
            departure_time: self.departure_time,
            total_seats: self.total_seats,
            available_seats: self.available_seats,
            fare_per_seat: self.fare_per_seat,
            currency: self.currency,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub passenger_id: String,
    pub passenger_email: Option<String>,
    pub seats_booked: i32,
    pub fare_per_seat: i64,
    pub total_fare: i64,
    pub currency: String,
    pub status: String,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub payment_status: String,
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

impl BookingRow {
    pub fn into_booking(self) -> Result<Booking, CoreError> {
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| corrupt("booking status", &self.status))?;
        let payment_status = PaymentStatus::parse(&self.payment_status)
            .ok_or_else(|| corrupt("payment status", &self.payment_status))?;
        let cancelled_by = match self.cancelled_by {
            Some(value) => {
                Some(CancelledBy::parse(&value).ok_or_else(|| corrupt("cancelled_by", &value))?)
            }
            None => None,
        };
        Ok(Booking {
            id: self.id,
            ride_id: self.ride_id,
            passenger_id: self.passenger_id,
            passenger_email: self.passenger_email.map(Masked::new),
            seats_booked: self.seats_booked,
            fare_per_seat: self.fare_per_seat,
            total_fare: self.total_fare,
            currency: self.currency,
            status,
            cancelled_by,
            cancellation_reason: self.cancellation_reason,
            payment_status,
            confirmed_at: self.confirmed_at,
            coming_for_pickup_at: self.coming_for_pickup_at,
            picked_up_at: self.picked_up_at,
            in_transit_at: self.in_transit_at,
            dropped_off_at: self.dropped_off_at,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
            rejected_at: self.rejected_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub reviewer_id: String,
    pub reviewee_id: String,
    pub review_type: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub aspects: Option<serde_json::Value>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewRow {
    pub fn into_review(self) -> Result<Review, CoreError> {
        let review_type = ReviewType::parse(&self.review_type)
            .ok_or_else(|| corrupt("review type", &self.review_type))?;
        let aspects = match self.aspects {
            Some(value) => Some(
                serde_json::from_value::<AspectRatings>(value)
                    .map_err(|e| CoreError::Internal(format!("invalid aspects payload: {}", e)))?,
            ),
            None => None,
        };
        Ok(Review {
            id: self.id,
            booking_id: self.booking_id,
            ride_id: self.ride_id,
            reviewer_id: self.reviewer_id,
            reviewee_id: self.reviewee_id,
            review_type,
            rating: self.rating,
            comment: self.comment,
            aspects,
            is_visible: self.is_visible,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub driver_id: String,
    pub contact_email: Option<String>,
    pub is_approved: bool,
    pub total_rides: i64,
    pub total_earnings: i64,
    pub rating: Option<f64>,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn into_profile(self) -> DriverProfile {
        DriverProfile {
            driver_id: self.driver_id,
            contact_email: self.contact_email,
            is_approved: self.is_approved,
            total_rides: self.total_rides,
            total_earnings: self.total_earnings,
            rating: self.rating,
            rating_count: self.rating_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
