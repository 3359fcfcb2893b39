use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use tandem_core::repository::{NewReview, ReviewEligibility, ReviewUpdate};
use tandem_review::{AspectRatings, Review};

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub aspects: Option<AspectRatings>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub aspects: Option<AspectRatings>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reviews", post(create_review))
        .route("/v1/reviews/{id}", put(update_review).delete(delete_review))
        .route("/v1/reviews/driver/{driver_id}", get(driver_reviews))
        .route("/v1/reviews/can-review/{booking_id}", get(can_review))
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_review(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .reviews
        .create_review(&NewReview {
            booking_id: req.booking_id,
            reviewer_id: principal.id,
            rating: req.rating,
            comment: req.comment,
            aspects: req.aspects,
        })
        .await?;

    tracing::info!(
        review_id = %review.id,
        booking_id = %review.booking_id,
        review_type = review.review_type.as_str(),
        "review created"
    );
    Ok(Json(review))
}

async fn update_review(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .reviews
        .update_review(
            id,
            &principal.id,
            &ReviewUpdate {
                rating: req.rating,
                comment: req.comment,
                aspects: req.aspects,
            },
        )
        .await?;
    Ok(Json(review))
}

async fn delete_review(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.reviews.delete_review(id, &principal.id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn driver_reviews(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.reviews.reviews_for_driver(&driver_id).await?;
    Ok(Json(reviews))
}

async fn can_review(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ReviewEligibility>, AppError> {
    let eligibility = state.reviews.can_review(booking_id, &principal.id).await?;
    Ok(Json(eligibility))
}
