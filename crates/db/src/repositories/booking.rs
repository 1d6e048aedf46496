use chrono::{DateTime, Utc};
use sqlx::Row;

use medbook_core::domain::booking::{Booking, BookingId, BookingStatus, NewBooking};
use medbook_core::domain::customer::CustomerId;

use super::{BookingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn booking_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Booking, RepositoryError> {
    let status_raw: String = row.try_get("status").map_err(RepositoryError::Database)?;
    let status = status_raw
        .parse::<BookingStatus>()
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    Ok(Booking {
        id: BookingId(row.try_get("id").map_err(RepositoryError::Database)?),
        customer_id: CustomerId(row.try_get("customer_id").map_err(RepositoryError::Database)?),
        booking_type: row.try_get("booking_type").map_err(RepositoryError::Database)?,
        date: row.try_get("date").map_err(RepositoryError::Database)?,
        time: row.try_get("time").map_err(RepositoryError::Database)?,
        status,
        notes: row.try_get("notes").map_err(RepositoryError::Database)?,
        created_at: row
            .try_get::<Option<DateTime<Utc>>, _>("created_at")
            .map_err(RepositoryError::Database)?,
    })
}

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO bookings (customer_id, booking_type, date, time, status, notes) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, customer_id, booking_type, date, time, status, notes, created_at",
        )
        .bind(booking.customer_id.0)
        .bind(&booking.booking_type)
        .bind(&booking.date)
        .bind(&booking.time)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(&booking.notes)
        .fetch_one(&self.pool)
        .await?;

        booking_from_row(&row)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, customer_id, booking_type, date, time, status, notes, created_at \
             FROM bookings WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn list_for_customer(&self, id: CustomerId) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, customer_id, booking_type, date, time, status, notes, created_at \
             FROM bookings WHERE customer_id = ? ORDER BY date DESC, time DESC",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM bookings")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count").map_err(RepositoryError::Database)
    }
}
