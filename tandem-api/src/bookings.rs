use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tandem_booking::{Booking, BookingStatus, CancelledBy, PaymentStatus};
use tandem_core::identity::{Principal, Role};
use tandem_core::repository::NewBooking;
use tandem_core::CoreError;
use tandem_shared::events::{BookingCompletedEvent, BookingDecisionEvent, BookingRequestedEvent};
use tandem_shared::pii::Masked;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub ride_id: Uuid,
    pub seats: i32,
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
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
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            ride_id: booking.ride_id,
            passenger_id: booking.passenger_id,
            passenger_email: booking.passenger_email,
            seats_booked: booking.seats_booked,
            fare_per_seat: booking.fare_per_seat,
            total_fare: booking.total_fare,
            currency: booking.currency,
            status: booking.status,
            cancelled_by: booking.cancelled_by,
            cancellation_reason: booking.cancellation_reason,
            payment_status: booking.payment_status,
            confirmed_at: booking.confirmed_at,
            completed_at: booking.completed_at,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/cancel", patch(cancel_booking))
        .route("/v1/bookings/{id}/respond", patch(respond_to_booking))
        .route("/v1/bookings/{id}/status", patch(update_booking_status))
        .route("/v1/bookings/ride/{ride_id}", get(bookings_for_ride))
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_booking(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    principal.require_role(Role::Passenger)?;

    let booking = state
        .bookings
        .create_booking(&NewBooking {
            ride_id: req.ride_id,
            passenger_id: principal.id.clone(),
            passenger_email: principal.email.clone(),
            seats: req.seats,
        })
        .await?;

    tracing::info!(
        booking_id = %booking.id,
        ride_id = %booking.ride_id,
        seats = booking.seats_booked,
        "booking requested"
    );

    // Best-effort heads-up to the driver; the booking stands either way.
    if let Ok(Some(ride)) = state.rides.get_ride(booking.ride_id).await {
        let driver_email = state
            .drivers
            .get_profile(&ride.driver_id)
            .await
            .ok()
            .flatten()
            .and_then(|p| p.contact_email);
        let event = BookingRequestedEvent {
            booking_id: booking.id,
            ride_id: ride.id,
            passenger_id: booking.passenger_id.clone(),
            driver_email,
            seats_booked: booking.seats_booked,
            origin_city: ride.origin.city.clone(),
            destination_city: ride.destination.city.clone(),
            departure_ts: ride.departure_time.timestamp(),
        };
        if let Err(err) = state.notifier.booking_requested(&event).await {
            tracing::warn!(booking_id = %booking.id, error = %err, "booking notification failed");
        }
    }

    Ok(Json(booking.into()))
}

async fn get_booking(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| CoreError::not_found("booking"))?;

    ensure_participant(&state, &principal, &booking).await?;
    Ok(Json(booking.into()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    principal.require_role(Role::Passenger)?;
    let booking = state.bookings.cancel(id, &principal.id, req.reason).await?;
    tracing::info!(booking_id = %booking.id, "booking cancelled by passenger");
    Ok(Json(booking.into()))
}

async fn respond_to_booking(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    principal.require_role(Role::Driver)?;

    let booking = state.bookings.respond(id, &principal.id, req.accept).await?;
    tracing::info!(
        booking_id = %booking.id,
        accepted = req.accept,
        "driver responded to booking"
    );

    let event = BookingDecisionEvent {
        booking_id: booking.id,
        ride_id: booking.ride_id,
        passenger_email: booking.passenger_email.as_ref().map(|e| e.inner().clone()),
        accepted: req.accept,
        timestamp: Utc::now().timestamp(),
    };
    if let Err(err) = state.notifier.booking_decided(&event).await {
        tracing::warn!(booking_id = %booking.id, error = %err, "decision notification failed");
    }

    Ok(Json(booking.into()))
}

async fn update_booking_status(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    principal.require_role(Role::Driver)?;

    let booking = state.bookings.advance(id, &principal.id, req.status).await?;
    tracing::info!(
        booking_id = %booking.id,
        status = booking.status.as_str(),
        "trip progress updated"
    );

    if booking.status == BookingStatus::Completed {
        let event = BookingCompletedEvent {
            booking_id: booking.id,
            ride_id: booking.ride_id,
            passenger_email: booking.passenger_email.as_ref().map(|e| e.inner().clone()),
            total_fare: booking.total_fare,
            currency: booking.currency.clone(),
            timestamp: Utc::now().timestamp(),
        };
        if let Err(err) = state.notifier.booking_completed(&event).await {
            tracing::warn!(booking_id = %booking.id, error = %err, "completion notification failed");
        }
    }

    Ok(Json(booking.into()))
}

async fn bookings_for_ride(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let ride = state
        .rides
        .get_ride(ride_id)
        .await?
        .ok_or_else(|| CoreError::not_found("ride"))?;
    if ride.driver_id != principal.id && !principal.has_role(Role::Admin) {
        return Err(CoreError::Forbidden(
            "only the ride's driver may list its bookings".to_string(),
        )
        .into());
    }

    let bookings = state.bookings.list_for_ride(ride_id).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// A booking is visible to its passenger, the ride's driver, and admins.
async fn ensure_participant(
    state: &AppState,
    principal: &Principal,
    booking: &Booking,
) -> Result<(), AppError> {
    if booking.passenger_id == principal.id || principal.has_role(Role::Admin) {
        return Ok(());
    }
    let ride = state
        .rides
        .get_ride(booking.ride_id)
        .await?
        .ok_or_else(|| CoreError::not_found("ride"))?;
    if ride.driver_id == principal.id {
        return Ok(());
    }
    Err(CoreError::Forbidden("not a participant of this booking".to_string()).into())
}
