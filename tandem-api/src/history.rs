//! Read-only history and stats views over bookings. Thin by design: each
//! endpoint is one repository aggregation shaped for a dashboard.

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use tandem_core::identity::Role;
use tandem_core::repository::{BookingScope, DriverStats, PassengerStats};

use crate::bookings::BookingResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger: Option<PassengerStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverStats>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/my", get(my_bookings))
        .route("/v1/bookings/active", get(active_bookings))
        .route("/v1/bookings/history", get(booking_history))
        .route("/v1/bookings/stats", get(booking_stats))
}

async fn my_bookings(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state
        .bookings
        .list_for_passenger(&principal.id, BookingScope::All)
        .await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

async fn active_bookings(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state
        .bookings
        .list_for_passenger(&principal.id, BookingScope::Active)
        .await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

async fn booking_history(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state
        .bookings
        .list_for_passenger(&principal.id, BookingScope::History)
        .await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// Stats shaped by role: passengers see their travel totals, drivers their
/// earnings and rating. A caller holding both roles gets both views.
async fn booking_stats(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<StatsResponse>, AppError> {
    let passenger = if principal.has_role(Role::Passenger) {
        Some(state.bookings.passenger_stats(&principal.id).await?)
    } else {
        None
    };
    let driver = if principal.has_role(Role::Driver) {
        match state.drivers.driver_stats(&principal.id).await {
            Ok(stats) => Some(stats),
            Err(tandem_core::CoreError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        }
    } else {
        None
    };

    Ok(Json(StatsResponse { passenger, driver }))
}
