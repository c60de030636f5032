use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Appointment requested through the public booking form
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub date: NaiveDateTime,
    pub name: String,
    pub phone: String,
    pub car_number: String,
    pub client_desc: String,
    pub manager_desc: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingInput {
    /// `YYYY-MM-DDTHH:MM`, as sent by a datetime-local form field
    pub date: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub car_number: String,
    #[serde(default)]
    pub client_desc: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingUpdate {
    pub name: String,
    pub phone: String,
    pub car_number: String,
    #[serde(default)]
    pub client_desc: String,
    #[serde(default)]
    pub manager_desc: String,
}

pub fn parse_booking_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_form_datetime() {
        let date = parse_booking_date("2025-07-16T09:30").unwrap();
        assert_eq!((date.month(), date.day(), date.hour(), date.minute()), (7, 16, 9, 30));
        assert!(parse_booking_date("2025-07-16T09:30:15").is_some());
        assert!(parse_booking_date("16.07.2025").is_none());
    }
}
