use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use tandem_core::identity::Role;
use tandem_core::CoreError;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Public slice of a driver profile: rating and volume, no contact details
/// or earnings.
#[derive(Debug, Serialize)]
pub struct DriverProfileResponse {
    pub driver_id: String,
    pub is_approved: bool,
    pub total_rides: i64,
    pub rating: Option<f64>,
    pub rating_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetApprovalRequest {
    pub approved: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/drivers/{id}/profile", get(driver_profile))
        .route("/v1/drivers/{id}/approval", patch(set_approval))
}

async fn driver_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DriverProfileResponse>, AppError> {
    let profile = state
        .drivers
        .get_profile(&id)
        .await?
        .ok_or_else(|| CoreError::not_found("driver profile"))?;

    Ok(Json(DriverProfileResponse {
        driver_id: profile.driver_id,
        is_approved: profile.is_approved,
        total_rides: profile.total_rides,
        rating: profile.rating,
        rating_count: profile.rating_count,
    }))
}

/// Approval is granted by the operations side; the engine only records it.
async fn set_approval(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetApprovalRequest>,
) -> Result<Json<DriverProfileResponse>, AppError> {
    principal.require_role(Role::Admin)?;

    let profile = state.drivers.ensure_profile(&id, None).await?;
    let profile = state
        .drivers
        .set_approval(&profile.driver_id, req.approved)
        .await?;
    tracing::info!(driver_id = %profile.driver_id, approved = req.approved, "driver approval updated");

    Ok(Json(DriverProfileResponse {
        driver_id: profile.driver_id,
        is_approved: profile.is_approved,
        total_rides: profile.total_rides,
        rating: profile.rating,
        rating_count: profile.rating_count,
    }))
}
