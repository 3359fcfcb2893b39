use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tandem_booking::{Booking, BookingStatus};
use tandem_review::{AspectRatings, Review};
use tandem_ride::{Ride, RideStatus};

use crate::driver::DriverProfile;
use crate::CoreResult;

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RideSearch {
    pub origin_city: Option<String>,
    pub destination_city: Option<String>,
    pub date: Option<NaiveDate>,
    pub seats: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct RideUpdate {
    pub departure_time: Option<DateTime<Utc>>,
    pub total_seats: Option<i32>,
    pub fare_per_seat: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub ride_id: Uuid,
    pub passenger_id: String,
    pub passenger_email: Option<String>,
    pub seats: i32,
}

/// Which slice of a passenger's bookings to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingScope {
    All,
    /// Requested or underway: anything that still occupies seats and has not
    /// reached a terminal state.
    Active,
    /// Terminal records: completed, cancelled, rejected.
    History,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub booking_id: Uuid,
    pub reviewer_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub aspects: Option<AspectRatings>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub aspects: Option<AspectRatings>,
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ReviewEligibility {
    pub can_review: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassengerStats {
    pub total_bookings: i64,
    pub completed_rides: i64,
    pub cancelled_bookings: i64,
    pub total_spent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverStats {
    pub total_rides: i64,
    pub total_earnings: i64,
    pub rating: Option<f64>,
    pub rating_count: i32,
    pub rides_posted: i64,
}

// ============================================================================
// Repository traits
// ============================================================================

#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn create_ride(&self, ride: &Ride) -> CoreResult<()>;

    async fn get_ride(&self, id: Uuid) -> CoreResult<Option<Ride>>;

    async fn list_upcoming(&self, limit: i64) -> CoreResult<Vec<Ride>>;

    async fn search(&self, filter: &RideSearch, limit: i64) -> CoreResult<Vec<Ride>>;

    async fn rides_by_driver(&self, driver_id: &str) -> CoreResult<Vec<Ride>>;

    /// Apply a schedule/capacity edit. Fails while any booking on the ride
    /// is confirmed-or-later.
    async fn update_ride(
        &self,
        id: Uuid,
        driver_id: &str,
        update: &RideUpdate,
    ) -> CoreResult<Ride>;

    /// Move the ride through its own status pipeline. Cancelling cascades:
    /// every pending/confirmed booking flips to cancelled-by-driver in the
    /// same transaction, and the cancelled bookings are returned.
    async fn set_status(
        &self,
        id: Uuid,
        driver_id: &str,
        target: RideStatus,
    ) -> CoreResult<(Ride, Vec<Booking>)>;

    /// Remove a posting. Only legal while no booking, of any status, has
    /// ever referenced it.
    async fn delete_ride(&self, id: Uuid, driver_id: &str) -> CoreResult<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Create a pending booking and reserve its seats as one atomic unit.
    async fn create_booking(&self, req: &NewBooking) -> CoreResult<Booking>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Driver accepts or rejects a pending booking. Rejection releases the
    /// reserved seats in the same transaction.
    async fn respond(&self, id: Uuid, driver_id: &str, accept: bool) -> CoreResult<Booking>;

    /// Passenger cancels a pending or confirmed booking, releasing seats.
    async fn cancel(
        &self,
        id: Uuid,
        passenger_id: &str,
        reason: Option<String>,
    ) -> CoreResult<Booking>;

    /// Driver advances a confirmed booking one step along the chain.
    /// Reaching `Completed` settles: payment marked paid and driver totals
    /// incremented, exactly once.
    async fn advance(&self, id: Uuid, driver_id: &str, target: BookingStatus)
        -> CoreResult<Booking>;

    async fn list_for_passenger(
        &self,
        passenger_id: &str,
        scope: BookingScope,
    ) -> CoreResult<Vec<Booking>>;

    async fn list_for_ride(&self, ride_id: Uuid) -> CoreResult<Vec<Booking>>;

    async fn passenger_stats(&self, passenger_id: &str) -> CoreResult<PassengerStats>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(&self, req: &NewReview) -> CoreResult<Review>;

    async fn update_review(
        &self,
        id: Uuid,
        reviewer_id: &str,
        update: &ReviewUpdate,
    ) -> CoreResult<Review>;

    async fn delete_review(&self, id: Uuid, reviewer_id: &str) -> CoreResult<()>;

    async fn reviews_for_driver(&self, driver_id: &str) -> CoreResult<Vec<Review>>;

    async fn can_review(&self, booking_id: Uuid, reviewer_id: &str)
        -> CoreResult<ReviewEligibility>;
}

#[async_trait]
pub trait DriverProfileRepository: Send + Sync {
    async fn get_profile(&self, driver_id: &str) -> CoreResult<Option<DriverProfile>>;

    /// Fetch-or-create, recording the contact email on first sight.
    async fn ensure_profile(
        &self,
        driver_id: &str,
        contact_email: Option<&str>,
    ) -> CoreResult<DriverProfile>;

    async fn set_approval(&self, driver_id: &str, approved: bool) -> CoreResult<DriverProfile>;

    async fn driver_stats(&self, driver_id: &str) -> CoreResult<DriverStats>;
}
