use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tandem_booking::LifecycleError;
use tandem_core::CoreError;
use tandem_review::ReviewError;
use tandem_ride::{InventoryError, RideError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    Core(CoreError),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Core(err)
    }
}

/// Status mapping for the domain taxonomy. Every domain-rule violation is a
/// 4xx with the rule's own message; only `Internal` gets the generic 500
/// treatment.
fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::Inventory(inner) => match inner {
            InventoryError::InvalidSeatRequest { .. } => StatusCode::BAD_REQUEST,
            InventoryError::RideNotBookable { .. }
            | InventoryError::InsufficientCapacity { .. }
            | InventoryError::ReleaseOverflow { .. } => StatusCode::CONFLICT,
        },
        CoreError::Ride(inner) => match inner {
            RideError::InvalidStatusChange { .. } => StatusCode::CONFLICT,
            RideError::CapacityBelowBooked { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        },
        CoreError::Lifecycle(inner) => match inner {
            LifecycleError::ForbiddenActor { .. } => StatusCode::FORBIDDEN,
            LifecycleError::InvalidSeatCount { .. } | LifecycleError::OwnRide => {
                StatusCode::BAD_REQUEST
            }
            LifecycleError::InvalidTransition { .. }
            | LifecycleError::AlreadyBooked
            | LifecycleError::RideNotOpen { .. } => StatusCode::CONFLICT,
        },
        CoreError::Review(inner) => match inner {
            ReviewError::NotParticipant | ReviewError::NotReviewer => StatusCode::FORBIDDEN,
            ReviewError::InvalidRating { .. } => StatusCode::BAD_REQUEST,
            ReviewError::NotCompleted { .. }
            | ReviewError::DuplicateReview
            | ReviewError::EditWindowExpired => StatusCode::CONFLICT,
        },
        CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Core(err) => {
                let status = status_for(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("Internal Server Error: {}", err);
                    (status, "Internal Server Error".to_string())
                } else {
                    (status, err.to_string())
                }
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(
            status_for(&CoreError::Inventory(
                InventoryError::InsufficientCapacity {
                    requested: 2,
                    available: 1
                }
            )),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CoreError::Review(ReviewError::DuplicateReview)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CoreError::Review(ReviewError::EditWindowExpired)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CoreError::Lifecycle(LifecycleError::invalid_transition(
                tandem_booking::BookingStatus::Confirmed,
                tandem_booking::BookingStatus::PickedUp,
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn ownership_mismatches_map_to_403() {
        assert_eq!(
            status_for(&CoreError::Forbidden("not yours".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&CoreError::Review(ReviewError::NotParticipant)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn validation_and_missing_resources() {
        assert_eq!(
            status_for(&CoreError::Validation("bad input".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&CoreError::not_found("ride")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&CoreError::Internal("db down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
