use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use tandem_booking::Booking;
use tandem_core::repository::{RideRepository, RideSearch, RideUpdate};
use tandem_core::{CoreError, CoreResult};
use tandem_ride::{Ride, RideError, RideStatus};

use crate::rows::{BookingRow, RideRow, BOOKING_COLUMNS, RIDE_COLUMNS};

pub struct StoreRideRepository {
    pool: PgPool,
}

impl StoreRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RideRepository for StoreRideRepository {
    async fn create_ride(&self, ride: &Ride) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO rides (id, driver_id, origin_address, origin_city, origin_lat, origin_lng, \
             destination_address, destination_city, destination_lat, destination_lng, \
             departure_time, total_seats, available_seats, fare_per_seat, currency, status, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(ride.id)
        .bind(&ride.driver_id)
        .bind(&ride.origin.address)
        .bind(&ride.origin.city)
        .bind(ride.origin.lat)
        .bind(ride.origin.lng)
        .bind(&ride.destination.address)
        .bind(&ride.destination.city)
        .bind(ride.destination.lat)
        .bind(ride.destination.lng)
        .bind(ride.departure_time)
        .bind(ride.total_seats)
        .bind(ride.available_seats)
        .bind(ride.fare_per_seat)
        .bind(&ride.currency)
        .bind(ride.status.as_str())
        .bind(ride.created_at)
        .bind(ride.updated_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        Ok(())
    }

    async fn get_ride(&self, id: Uuid) -> CoreResult<Option<Ride>> {
        let row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        row.map(RideRow::into_ride).transpose()
    }

    async fn list_upcoming(&self, limit: i64) -> CoreResult<Vec<Ride>> {
        let rows = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides \
             WHERE status = 'SCHEDULED' AND departure_time > $1 \
             ORDER BY departure_time ASC LIMIT $2"
        ))
        .bind(Utc::now())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        rows.into_iter().map(RideRow::into_ride).collect()
    }

    async fn search(&self, filter: &RideSearch, limit: i64) -> CoreResult<Vec<Ride>> {
        let rows = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides \
             WHERE status = 'SCHEDULED' \
               AND departure_time > $1 \
               AND ($2::text IS NULL OR origin_city ILIKE $2) \
               AND ($3::text IS NULL OR destination_city ILIKE $3) \
               AND ($4::date IS NULL OR DATE(departure_time) = $4) \
               AND ($5::int IS NULL OR available_seats >= $5) \
             ORDER BY departure_time ASC LIMIT $6"
        ))
        .bind(Utc::now())
        .bind(filter.origin_city.as_deref())
        .bind(filter.destination_city.as_deref())
        .bind(filter.date)
        .bind(filter.seats)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        rows.into_iter().map(RideRow::into_ride).collect()
    }

    async fn rides_by_driver(&self, driver_id: &str) -> CoreResult<Vec<Ride>> {
        let rows = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE driver_id = $1 ORDER BY departure_time DESC"
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        rows.into_iter().map(RideRow::into_ride).collect()
    }

    async fn update_ride(
        &self,
        id: Uuid,
        driver_id: &str,
        update: &RideUpdate,
    ) -> CoreResult<Ride> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;

        let row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        let mut ride = row.ok_or_else(|| CoreError::not_found("ride"))?.into_ride()?;
        if ride.driver_id != driver_id {
            return Err(CoreError::Forbidden(
                "only the ride's driver may edit it".to_string(),
            ));
        }

        // Schedule/capacity edits are frozen once any booking is past Pending.
        let confirmed_or_later: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE ride_id = $1 \
             AND status NOT IN ('PENDING', 'CANCELLED', 'REJECTED')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(CoreError::internal)?;
        if confirmed_or_later > 0 {
            return Err(CoreError::Validation(
                "ride details are locked once a booking has been confirmed".to_string(),
            ));
        }

        let active_booked: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(seats_booked), 0) FROM bookings WHERE ride_id = $1 \
             AND status NOT IN ('CANCELLED', 'REJECTED')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        ride.apply_update(
            update.departure_time,
            update.total_seats,
            update.fare_per_seat,
            active_booked as i32,
            Utc::now(),
        )?;

        sqlx::query(
            "UPDATE rides SET departure_time = $2, total_seats = $3, available_seats = $4, \
             fare_per_seat = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(id)
        .bind(ride.departure_time)
        .bind(ride.total_seats)
        .bind(ride.available_seats)
        .bind(ride.fare_per_seat)
        .bind(ride.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(ride)
    }

    async fn set_status(
        &self,
        id: Uuid,
        driver_id: &str,
        target: RideStatus,
    ) -> CoreResult<(Ride, Vec<Booking>)> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;

        let row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        let mut ride = row.ok_or_else(|| CoreError::not_found("ride"))?.into_ride()?;
        if ride.driver_id != driver_id {
            return Err(CoreError::Forbidden(
                "only the ride's driver may change its status".to_string(),
            ));
        }
        if !ride.status.can_transition_to(target) {
            return Err(CoreError::Ride(RideError::InvalidStatusChange {
                from: ride.status.as_str().to_string(),
                to: target.as_str().to_string(),
            }));
        }

        let now = Utc::now();
        sqlx::query("UPDATE rides SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(target.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::internal)?;
        ride.status = target;
        ride.updated_at = now;

        let mut cancelled = Vec::new();
        if target == RideStatus::Cancelled {
            // Cascade: every booking still awaiting or holding a confirmed
            // seat flips to cancelled-by-driver. The ride is terminal, so no
            // seats are re-released.
            let rows = sqlx::query_as::<_, BookingRow>(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE ride_id = $1 \
                 AND status IN ('PENDING', 'CONFIRMED') FOR UPDATE"
            ))
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .map_err(CoreError::internal)?;

            sqlx::query(
                "UPDATE bookings SET status = 'CANCELLED', cancelled_by = 'DRIVER', \
                 cancellation_reason = 'ride cancelled by driver', cancelled_at = $2, \
                 updated_at = $2 WHERE ride_id = $1 AND status IN ('PENDING', 'CONFIRMED')",
            )
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::internal)?;

            for row in rows {
                let mut booking = row.into_booking()?;
                booking.status = tandem_booking::BookingStatus::Cancelled;
                booking.cancelled_by = Some(tandem_booking::CancelledBy::Driver);
                booking.cancellation_reason = Some("ride cancelled by driver".to_string());
                booking.cancelled_at = Some(now);
                booking.updated_at = now;
                cancelled.push(booking);
            }
        }

        tx.commit().await.map_err(CoreError::internal)?;
        Ok((ride, cancelled))
    }

    async fn delete_ride(&self, id: Uuid, driver_id: &str) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;

        let row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        let ride = row.ok_or_else(|| CoreError::not_found("ride"))?.into_ride()?;
        if ride.driver_id != driver_id {
            return Err(CoreError::Forbidden(
                "only the ride's driver may delete it".to_string(),
            ));
        }

        let booking_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE ride_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(CoreError::internal)?;
        if booking_count > 0 {
            return Err(CoreError::Validation(
                "a ride with bookings cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM rides WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::internal)?;

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(())
    }
}
