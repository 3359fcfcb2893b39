use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use tandem_core::driver::DriverProfile;
use tandem_core::repository::{DriverProfileRepository, DriverStats};
use tandem_core::{CoreError, CoreResult};

use crate::rows::{ProfileRow, PROFILE_COLUMNS};

pub struct StoreDriverRepository {
    pool: PgPool,
}

impl StoreDriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverProfileRepository for StoreDriverRepository {
    async fn get_profile(&self, driver_id: &str) -> CoreResult<Option<DriverProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM driver_profiles WHERE driver_id = $1"
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        Ok(row.map(ProfileRow::into_profile))
    }

    async fn ensure_profile(
        &self,
        driver_id: &str,
        contact_email: Option<&str>,
    ) -> CoreResult<DriverProfile> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO driver_profiles (driver_id, contact_email, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) \
             ON CONFLICT (driver_id) DO UPDATE SET \
               contact_email = COALESCE(driver_profiles.contact_email, EXCLUDED.contact_email), \
               updated_at = $3 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(driver_id)
        .bind(contact_email)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        Ok(row.into_profile())
    }

    async fn set_approval(&self, driver_id: &str, approved: bool) -> CoreResult<DriverProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE driver_profiles SET is_approved = $2, updated_at = $3 WHERE driver_id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(driver_id)
        .bind(approved)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        row.map(ProfileRow::into_profile)
            .ok_or_else(|| CoreError::not_found("driver profile"))
    }

    async fn driver_stats(&self, driver_id: &str) -> CoreResult<DriverStats> {
        let profile = self
            .get_profile(driver_id)
            .await?
            .ok_or_else(|| CoreError::not_found("driver profile"))?;

        let rides_posted: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rides WHERE driver_id = $1")
                .bind(driver_id)
                .fetch_one(&self.pool)
                .await
                .map_err(CoreError::internal)?;

        Ok(DriverStats {
            total_rides: profile.total_rides,
            total_earnings: profile.total_earnings,
            rating: profile.rating,
            rating_count: profile.rating_count,
            rides_posted,
        })
    }
}
