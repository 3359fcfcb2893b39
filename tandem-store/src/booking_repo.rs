use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use tandem_booking::lifecycle::{self, Actor};
use tandem_booking::settlement::CompletionEffects;
use tandem_booking::{Booking, BookingStatus, CancelledBy};
use tandem_core::repository::{BookingRepository, BookingScope, NewBooking, PassengerStats};
use tandem_core::{CoreError, CoreResult};
use tandem_ride::Ride;

use crate::rows::{BookingRow, RideRow, BOOKING_COLUMNS, RIDE_COLUMNS};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock and load the booking and its parent ride. Every seat-affecting
    /// operation goes through here so concurrent writers on the same ride
    /// serialize on the row locks instead of racing the seat counter. Locks
    /// are always taken ride first, booking second, matching the cascade
    /// path in the ride repository so the two cannot deadlock.
    async fn lock_booking_and_ride(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> CoreResult<(Booking, Ride)> {
        let ride_id: Option<Uuid> =
            sqlx::query_scalar("SELECT ride_id FROM bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(CoreError::internal)?;
        let ride_id = ride_id.ok_or_else(|| CoreError::not_found("booking"))?;

        let ride_row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 FOR UPDATE"
        ))
        .bind(ride_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(CoreError::internal)?;
        let ride = ride_row
            .ok_or_else(|| CoreError::not_found("ride"))?
            .into_ride()?;

        // Re-read under the lock: the unlocked peek above only located the
        // ride, it must not feed the transition checks.
        let booking_row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(CoreError::internal)?;
        let booking = booking_row
            .ok_or_else(|| CoreError::not_found("booking"))?
            .into_booking()?;

        Ok((booking, ride))
    }

    async fn write_available_seats(
        tx: &mut Transaction<'_, Postgres>,
        ride: &Ride,
    ) -> CoreResult<()> {
        sqlx::query("UPDATE rides SET available_seats = $2, updated_at = $3 WHERE id = $1")
            .bind(ride.id)
            .bind(ride.available_seats)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await
            .map_err(CoreError::internal)?;
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, req: &NewBooking) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;

        // 1. Lock the ride row; the capacity check and decrement below are
        //    atomic with the booking insert.
        let ride_row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 FOR UPDATE"
        ))
        .bind(req.ride_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(CoreError::internal)?;
        let mut ride = ride_row
            .ok_or_else(|| CoreError::not_found("ride"))?
            .into_ride()?;

        // 2. One live booking per passenger per ride.
        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE ride_id = $1 AND passenger_id = $2 \
             AND status NOT IN ('CANCELLED', 'REJECTED')",
        )
        .bind(req.ride_id)
        .bind(&req.passenger_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        lifecycle::validate_creation(&ride, &req.passenger_id, existing > 0)?;

        // 3. Reserve seats and snapshot the fare at today's price.
        ride.reserve_seats(req.seats)?;
        let booking = Booking::new(
            ride.id,
            req.passenger_id.clone(),
            req.passenger_email.clone(),
            req.seats,
            ride.fare_per_seat,
            ride.currency.clone(),
            Utc::now(),
        )?;

        Self::write_available_seats(&mut tx, &ride).await?;

        sqlx::query(
            "INSERT INTO bookings (id, ride_id, passenger_id, passenger_email, seats_booked, \
             fare_per_seat, total_fare, currency, status, payment_status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(booking.id)
        .bind(booking.ride_id)
        .bind(&booking.passenger_id)
        .bind(booking.passenger_email.as_ref().map(|e| e.inner().clone()))
        .bind(booking.seats_booked)
        .bind(booking.fare_per_seat)
        .bind(booking.total_fare)
        .bind(&booking.currency)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn respond(&self, id: Uuid, driver_id: &str, accept: bool) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;
        let (mut booking, mut ride) = Self::lock_booking_and_ride(&mut tx, id).await?;

        if ride.driver_id != driver_id {
            return Err(CoreError::Forbidden(
                "only the ride's driver may respond to this booking".to_string(),
            ));
        }

        let target = if accept {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Rejected
        };
        lifecycle::authorize_transition(Actor::Driver, booking.status, target)?;

        let now = Utc::now();
        let sql = if accept {
            "UPDATE bookings SET status = 'CONFIRMED', confirmed_at = $2, updated_at = $2 \
             WHERE id = $1 AND status = 'PENDING'"
        } else {
            "UPDATE bookings SET status = 'REJECTED', rejected_at = $2, updated_at = $2 \
             WHERE id = $1 AND status = 'PENDING'"
        };
        let result = sqlx::query(sql)
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::internal)?;

        if result.rows_affected() == 0 {
            // A competing transition won the race after our status read.
            return Err(lifecycle::LifecycleError::invalid_transition(booking.status, target).into());
        }

        booking.status = target;
        booking.updated_at = now;
        if accept {
            booking.confirmed_at = Some(now);
        } else {
            booking.rejected_at = Some(now);
            // Rejection hands the reserved seats back, once: the status
            // guard above means no second release can follow.
            ride.release_seats(booking.seats_booked)?;
            Self::write_available_seats(&mut tx, &ride).await?;
        }

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(booking)
    }

    async fn cancel(
        &self,
        id: Uuid,
        passenger_id: &str,
        reason: Option<String>,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;
        let (mut booking, mut ride) = Self::lock_booking_and_ride(&mut tx, id).await?;

        if booking.passenger_id != passenger_id {
            return Err(CoreError::Forbidden(
                "only the booking's passenger may cancel it".to_string(),
            ));
        }

        lifecycle::authorize_transition(Actor::Passenger, booking.status, BookingStatus::Cancelled)?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED', cancelled_by = 'PASSENGER', \
             cancellation_reason = $2, cancelled_at = $3, updated_at = $3 \
             WHERE id = $1 AND status IN ('PENDING', 'CONFIRMED')",
        )
        .bind(id)
        .bind(&reason)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        if result.rows_affected() == 0 {
            return Err(lifecycle::LifecycleError::invalid_transition(
                booking.status,
                BookingStatus::Cancelled,
            )
            .into());
        }

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_by = Some(CancelledBy::Passenger);
        booking.cancellation_reason = reason;
        booking.cancelled_at = Some(now);
        booking.updated_at = now;

        ride.release_seats(booking.seats_booked)?;
        Self::write_available_seats(&mut tx, &ride).await?;

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(booking)
    }

    async fn advance(
        &self,
        id: Uuid,
        driver_id: &str,
        target: BookingStatus,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(CoreError::internal)?;
        let (mut booking, ride) = Self::lock_booking_and_ride(&mut tx, id).await?;

        if ride.driver_id != driver_id {
            return Err(CoreError::Forbidden(
                "only the ride's driver may update trip progress".to_string(),
            ));
        }

        // Respond and cancel have their own entry points; this one only
        // walks the post-confirmation chain.
        let timestamp_column = match target {
            BookingStatus::ComingForPickup => "coming_for_pickup_at",
            BookingStatus::PickedUp => "picked_up_at",
            BookingStatus::InTransit => "in_transit_at",
            BookingStatus::DroppedOff => "dropped_off_at",
            BookingStatus::Completed => "completed_at",
            _ => {
                return Err(CoreError::Validation(format!(
                    "{} is not a trip progress status",
                    target.as_str()
                )))
            }
        };

        lifecycle::authorize_transition(Actor::Driver, booking.status, target)?;

        let now = Utc::now();
        let result = sqlx::query(&format!(
            "UPDATE bookings SET status = $2, {timestamp_column} = $3, updated_at = $3 \
             WHERE id = $1 AND status = $4"
        ))
        .bind(id)
        .bind(target.as_str())
        .bind(now)
        .bind(booking.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(CoreError::internal)?;

        if result.rows_affected() == 0 {
            return Err(lifecycle::LifecycleError::invalid_transition(booking.status, target).into());
        }

        if target == BookingStatus::Completed {
            // Settlement rides on the DroppedOff → Completed guard above, so
            // a repeated completion request can never pay twice.
            let effects = CompletionEffects::for_booking(&booking)?;

            sqlx::query("UPDATE bookings SET payment_status = $2 WHERE id = $1")
                .bind(id)
                .bind(effects.payment_status.as_str())
                .execute(&mut *tx)
                .await
                .map_err(CoreError::internal)?;

            sqlx::query(
                "UPDATE driver_profiles SET total_rides = total_rides + $2, \
                 total_earnings = total_earnings + $3, updated_at = $4 WHERE driver_id = $1",
            )
            .bind(&ride.driver_id)
            .bind(effects.ride_count_increment)
            .bind(effects.earnings_increment)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::internal)?;

            booking.payment_status = effects.payment_status;
        }

        booking.status = target;
        booking.updated_at = now;
        match target {
            BookingStatus::ComingForPickup => booking.coming_for_pickup_at = Some(now),
            BookingStatus::PickedUp => booking.picked_up_at = Some(now),
            BookingStatus::InTransit => booking.in_transit_at = Some(now),
            BookingStatus::DroppedOff => booking.dropped_off_at = Some(now),
            BookingStatus::Completed => booking.completed_at = Some(now),
            _ => {}
        }

        tx.commit().await.map_err(CoreError::internal)?;
        Ok(booking)
    }

    async fn list_for_passenger(
        &self,
        passenger_id: &str,
        scope: BookingScope,
    ) -> CoreResult<Vec<Booking>> {
        let status_filter = match scope {
            BookingScope::All => "",
            BookingScope::Active => {
                " AND status IN ('PENDING', 'CONFIRMED', 'COMING_FOR_PICKUP', 'PICKED_UP', \
                 'IN_TRANSIT', 'DROPPED_OFF')"
            }
            BookingScope::History => " AND status IN ('COMPLETED', 'CANCELLED', 'REJECTED')",
        };

        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE passenger_id = $1{status_filter} \
             ORDER BY created_at DESC"
        ))
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_for_ride(&self, ride_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE ride_id = $1 ORDER BY created_at ASC"
        ))
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn passenger_stats(&self, passenger_id: &str) -> CoreResult<PassengerStats> {
        #[derive(sqlx::FromRow)]
        struct StatsRow {
            total_bookings: i64,
            completed_rides: i64,
            cancelled_bookings: i64,
            total_spent: i64,
        }

        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*) AS total_bookings, \
             COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed_rides, \
             COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled_bookings, \
             COALESCE(SUM(total_fare) FILTER (WHERE status = 'COMPLETED'), 0)::bigint AS total_spent \
             FROM bookings WHERE passenger_id = $1",
        )
        .bind(passenger_id)
        .fetch_one(&self.pool)
        .await
        .map_err(CoreError::internal)?;

        Ok(PassengerStats {
            total_bookings: row.total_bookings,
            completed_rides: row.completed_rides,
            cancelled_bookings: row.cancelled_bookings,
            total_spent: row.total_spent,
        })
    }
}
