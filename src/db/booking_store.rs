use chrono::{NaiveDateTime, Utc};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::booking::{Booking, BookingInput, BookingUpdate},
};

pub struct BookingStore {
    pool: DbPool,
}

impl BookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_booking(&self, date: NaiveDateTime, booking: &BookingInput) -> Result<Booking> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (date, name, phone, car_number, client_desc, manager_desc, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, '', ?, ?)
            RETURNING *
            "#,
        )
        .bind(date)
        .bind(&booking.name)
        .bind(&booking.phone)
        .bind(&booking.car_number)
        .bind(&booking.client_desc)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(created)
    }

    /// All bookings by appointment time
    pub async fn get_all_bookings(&self) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY date, id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(bookings)
    }

    pub async fn update_booking(&self, id: i64, booking: &BookingUpdate) -> Result<Booking> {
        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET name = ?, phone = ?, car_number = ?, client_desc = ?, manager_desc = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&booking.name)
        .bind(&booking.phone)
        .bind(&booking.car_number)
        .bind(&booking.client_desc)
        .bind(&booking.manager_desc)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found("Booking"))?;

        Ok(updated)
    }
}
