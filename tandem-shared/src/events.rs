use uuid::Uuid;

/// Payloads handed to the notification sink. These are best-effort side
/// channels: delivery failure never affects the state change that produced
/// them.

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingRequestedEvent {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub passenger_id: String,
    pub driver_email: Option<String>,
    pub seats_booked: i32,
    pub origin_city: String,
    pub destination_city: String,
    pub departure_ts: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingDecisionEvent {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub passenger_email: Option<String>,
    pub accepted: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCompletedEvent {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub passenger_email: Option<String>,
    pub total_fare: i64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RideCancelledEvent {
    pub ride_id: Uuid,
    pub cancelled_bookings: u64,
    pub passenger_emails: Vec<String>,
    pub timestamp: i64,
}
