use crate::{
    db::{DbPool, booking_store::BookingStore},
    error::{AppError, Result},
    models::{
        booking::{Booking, BookingInput, BookingUpdate, parse_booking_date},
        client::normalize_plate,
    },
};

/// Appointments left through the public form
pub struct BookingService {
    bookings: BookingStore,
}

impl BookingService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            bookings: BookingStore::new(pool),
        }
    }

    pub async fn create_booking(&self, mut input: BookingInput) -> Result<Booking> {
        let date = parse_booking_date(input.date.trim())
            .ok_or_else(|| AppError::validation("date must look like YYYY-MM-DDTHH:MM"))?;
        require(&input.name, "name")?;
        require(&input.phone, "phone")?;
        require(&input.car_number, "car_number")?;
        input.car_number = normalize_plate(&input.car_number);

        let booking = self.bookings.create_booking(date, &input).await?;
        tracing::info!(booking_id = booking.id, %date, "booking received");

        Ok(booking)
    }

    pub async fn get_bookings(&self) -> Result<Vec<Booking>> {
        self.bookings.get_all_bookings().await
    }

    pub async fn update_booking(&self, id: i64, mut update: BookingUpdate) -> Result<Booking> {
        require(&update.name, "name")?;
        require(&update.phone, "phone")?;
        require(&update.car_number, "car_number")?;
        update.car_number = normalize_plate(&update.car_number);

        let booking = self.bookings.update_booking(id, &update).await?;
        tracing::info!(booking_id = id, "booking updated");

        Ok(booking)
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}
