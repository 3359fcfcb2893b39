use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tandem_core::identity::Role;
use tandem_core::repository::{RideSearch, RideUpdate};
use tandem_core::CoreError;
use tandem_ride::{Location, Ride, RideStatus};
use tandem_shared::events::RideCancelledEvent;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub origin: Location,
    pub destination: Location,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    pub fare_per_seat: i64,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRideRequest {
    pub departure_time: Option<DateTime<Utc>>,
    pub total_seats: Option<i32>,
    pub fare_per_seat: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetRideStatusRequest {
    pub status: RideStatus,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
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
}

impl From<Ride> for RideResponse {
    fn from(ride: Ride) -> Self {
        Self {
            id: ride.id,
            driver_id: ride.driver_id,
            origin: ride.origin,
            destination: ride.destination,
            departure_time: ride.departure_time,
            total_seats: ride.total_seats,
            available_seats: ride.available_seats,
            fare_per_seat: ride.fare_per_seat,
            currency: ride.currency,
            status: ride.status,
            created_at: ride.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RideStatusResponse {
    pub ride: RideResponse,
    pub cancelled_bookings: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rides", get(list_rides).post(create_ride))
        .route("/v1/rides/search", get(search_rides))
        .route(
            "/v1/rides/{id}",
            get(get_ride).put(update_ride).delete(delete_ride),
        )
        .route("/v1/rides/{id}/status", patch(set_ride_status))
        .route("/v1/rides/mine", get(my_rides))
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_ride(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateRideRequest>,
) -> Result<Json<RideResponse>, AppError> {
    principal.require_role(Role::Driver)?;

    // Posting requires an approved driver profile.
    let profile = state
        .drivers
        .ensure_profile(&principal.id, principal.email.as_deref())
        .await?;
    if !profile.is_approved {
        return Err(CoreError::Validation(
            "driver is not approved to post rides".to_string(),
        )
        .into());
    }

    let ride = Ride::new(
        principal.id,
        req.origin,
        req.destination,
        req.departure_time,
        req.total_seats,
        req.fare_per_seat,
        req.currency.unwrap_or_else(|| "USD".to_string()),
        Utc::now(),
    )
    .map_err(CoreError::from)?;

    state.rides.create_ride(&ride).await?;
    tracing::info!(ride_id = %ride.id, driver_id = %ride.driver_id, "ride posted");

    Ok(Json(ride.into()))
}

async fn list_rides(State(state): State<AppState>) -> Result<Json<Vec<RideResponse>>, AppError> {
    let rides = state
        .rides
        .list_upcoming(state.business_rules.ride_listing_limit)
        .await?;
    Ok(Json(rides.into_iter().map(RideResponse::from).collect()))
}

async fn search_rides(
    State(state): State<AppState>,
    Query(filter): Query<RideSearch>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let rides = state
        .rides
        .search(&filter, state.business_rules.ride_listing_limit)
        .await?;
    Ok(Json(rides.into_iter().map(RideResponse::from).collect()))
}

async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state
        .rides
        .get_ride(id)
        .await?
        .ok_or_else(|| CoreError::not_found("ride"))?;
    Ok(Json(ride.into()))
}

async fn my_rides(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    principal.require_role(Role::Driver)?;
    let rides = state.rides.rides_by_driver(&principal.id).await?;
    Ok(Json(rides.into_iter().map(RideResponse::from).collect()))
}

async fn update_ride(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRideRequest>,
) -> Result<Json<RideResponse>, AppError> {
    principal.require_role(Role::Driver)?;

    let update = RideUpdate {
        departure_time: req.departure_time,
        total_seats: req.total_seats,
        fare_per_seat: req.fare_per_seat,
    };
    let ride = state.rides.update_ride(id, &principal.id, &update).await?;
    Ok(Json(ride.into()))
}

async fn set_ride_status(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetRideStatusRequest>,
) -> Result<Json<RideStatusResponse>, AppError> {
    principal.require_role(Role::Driver)?;

    let (ride, cancelled) = state.rides.set_status(id, &principal.id, req.status).await?;

    if req.status == RideStatus::Cancelled {
        tracing::info!(
            ride_id = %ride.id,
            cancelled = cancelled.len(),
            "ride cancelled, bookings cascaded"
        );
        let event = RideCancelledEvent {
            ride_id: ride.id,
            cancelled_bookings: cancelled.len() as u64,
            passenger_emails: cancelled
                .iter()
                .filter_map(|b| b.passenger_email.as_ref().map(|e| e.inner().clone()))
                .collect(),
            timestamp: Utc::now().timestamp(),
        };
        if let Err(err) = state.notifier.ride_cancelled(&event).await {
            tracing::warn!(ride_id = %ride.id, error = %err, "cancellation notifications failed");
        }
    }

    Ok(Json(RideStatusResponse {
        cancelled_bookings: cancelled.len() as u64,
        ride: ride.into(),
    }))
}

async fn delete_ride(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.require_role(Role::Driver)?;
    state.rides.delete_ride(id, &principal.id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
