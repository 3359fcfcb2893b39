use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use tandem_core::repository::{NewReview, ReviewEligibility, ReviewRepository, ReviewUpdate};
use tandem_core::{CoreError, CoreResult};
use tandem_review::ledger::{self, ReviewError};
use tandem_review::{rating, Review, ReviewType};

use crate::rows::{BookingRow, ReviewRow, BOOKING_COLUMNS, REVIEW_COLUMNS};

pub struct StoreReviewRepository {
    pool: PgPool,
    edit_window_hours: i64,
}

impl StoreReviewRepository {
    pub fn new(pool: PgPool, edit_window_hours: i64) -> Self {
        Self {
            pool,
            edit_window_hours,
        }
    }

    /// Wholesale recompute of the driver's rating cache from the full set of
    /// visible passenger-to-driver reviews. Runs inside the same transaction
    /// as the review mutation that made it necessary.
    async fn recompute_driver_rating(
        tx: &mut Transaction<'_, Postgres>,
        driver_id: &str,
    ) -> CoreResult<()> {
        let ratings: Vec<i32> = sqlx::query_scalar(
            "SELECT rating FROM reviews WHERE reviewee_id = $1 \
             AND review_type = 'PASSENGER_TO_DRIVER' AND is_visible = TRUE",
        )
        .bind(driver_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(CoreError::internal)?;

        let aggregate = rating::recompute(&ratings);

        sqlx::query(
            "UPDATE driver_profiles SET rating = $2, rating_count = $3, updated_at = $4 \
             WHERE driver_id = $1",
        )
        .bind(driver_id)
        .bind(aggregate)
        .bind(ratings.len() as i32)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(CoreError::internal)?;

        Ok(())
    }

    /// The booking under review plus the ride's driver, which together
    /// identify both participants.
    async fn booking_parties(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> CoreResult<(tandem_booking::Booking, String)> {
        let booking_row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(CoreError::internal)?;
        let booking = booking_row
            .ok_or_else(|| CoreError::not_found("booking"))?
            .into_booking()?;

        let driver_id: String = sqlx::query_scalar("SELECT driver_id FROM rides WHERE id = $1")
            .bind(booking.ride_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(CoreError::internal)?;

        Ok((booking, driver_id))
    }
}

#[async_trait]
impl ReviewRepository for StoreReviewRepository {
    async fn create_review(&self, req: &NewReview) -> CoreResult<Review> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;

        let (booking, driver_id) = Self::booking_parties(&mut tx, req.booking_id).await?;
        let (review_type, reviewee_id) = ledger::validate_creation(
            booking.status,
            &req.reviewer_id,
            &booking.passenger_id,
            &driver_id,
        )?;

        let review = Review::new(
            booking.id,
            booking.ride_id,
            req.reviewer_id.clone(),
            reviewee_id.clone(),
            review_type,
            req.rating,
            req.comment.clone(),
            req.aspects.clone(),
            Utc::now(),
        )?;

        let aspects_json = review
            .aspects
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(CoreError::internal)?;

        let inserted = sqlx::query(
            "INSERT INTO reviews (id, booking_id, ride_id, reviewer_id, reviewee_id, review_type, \
             rating, comment, aspects, is_visible, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(review.id)
        .bind(review.booking_id)
        .bind(review.ride_id)
        .bind(&review.reviewer_id)
        .bind(&review.reviewee_id)
        .bind(review.review_type.as_str())
        .bind(review.rating)
        .bind(&review.comment)
        .bind(aspects_json)
        .bind(review.is_visible)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            // The unique index on (booking_id, reviewer_id) is the
            // authoritative duplicate check.
            if let sqlx::Error::Database(db) = &err {
                if db.is_unique_violation() {
                    return Err(ReviewError::DuplicateReview.into());
                }
            }
            return Err(CoreError::internal(err));
        }

        if review.review_type == ReviewType::PassengerToDriver {
            Self::recompute_driver_rating(&mut tx, &reviewee_id).await?;
        }

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(review)
    }

    async fn update_review(
        &self,
        id: Uuid,
        reviewer_id: &str,
        update: &ReviewUpdate,
    ) -> CoreResult<Review> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;

        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(CoreError::internal)?;
        let mut review = row
            .ok_or_else(|| CoreError::not_found("review"))?
            .into_review()?;

        if review.reviewer_id != reviewer_id {
            return Err(ReviewError::NotReviewer.into());
        }
        let now = Utc::now();
        if !ledger::within_edit_window(review.created_at, now, self.edit_window_hours) {
            return Err(ReviewError::EditWindowExpired.into());
        }

        if let Some(new_rating) = update.rating {
            if !(1..=5).contains(&new_rating) {
                return Err(ReviewError::InvalidRating { given: new_rating }.into());
            }
            review.rating = new_rating;
        }
        if let Some(comment) = &update.comment {
            review.comment = Some(comment.clone());
        }
        if let Some(aspects) = &update.aspects {
            aspects.validate()?;
            review.aspects = Some(aspects.clone());
        }
        review.updated_at = now;

        let aspects_json = review
            .aspects
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(CoreError::internal)?;

        sqlx::query(
            "UPDATE reviews SET rating = $2, comment = $3, aspects = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(aspects_json)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        if review.review_type == ReviewType::PassengerToDriver {
            Self::recompute_driver_rating(&mut tx, &review.reviewee_id).await?;
        }

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(review)
    }

    async fn delete_review(&self, id: Uuid, reviewer_id: &str) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;

        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(CoreError::internal)?;
        let review = row
            .ok_or_else(|| CoreError::not_found("review"))?
            .into_review()?;

        if review.reviewer_id != reviewer_id {
            return Err(ReviewError::NotReviewer.into());
        }
        if !ledger::within_edit_window(review.created_at, Utc::now(), self.edit_window_hours) {
            return Err(ReviewError::EditWindowExpired.into());
        }

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::internal)?;

        if review.review_type == ReviewType::PassengerToDriver {
            Self::recompute_driver_rating(&mut tx, &review.reviewee_id).await?;
        }

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(())
    }

    async fn reviews_for_driver(&self, driver_id: &str) -> CoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE reviewee_id = $1 \
             AND review_type = 'PASSENGER_TO_DRIVER' AND is_visible = TRUE \
             ORDER BY created_at DESC"
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        rows.into_iter().map(ReviewRow::into_review).collect()
    }

    async fn can_review(
        &self,
        booking_id: Uuid,
        reviewer_id: &str,
    ) -> CoreResult<ReviewEligibility> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;
        let (booking, driver_id) = Self::booking_parties(&mut tx, booking_id).await?;

        if let Err(err) = ledger::validate_creation(
            booking.status,
            reviewer_id,
            &booking.passenger_id,
            &driver_id,
        ) {
            return Ok(ReviewEligibility {
                can_review: false,
                reason: Some(err.to_string()),
            });
        }

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE booking_id = $1 AND reviewer_id = $2",
        )
        .bind(booking_id)
        .bind(reviewer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        if existing > 0 {
            return Ok(ReviewEligibility {
                can_review: false,
                reason: Some(ReviewError::DuplicateReview.to_string()),
            });
        }

        Ok(ReviewEligibility {
            can_review: true,
            reason: None,
        })
    }
}
