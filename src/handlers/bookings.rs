use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::booking::{BookingInput, BookingUpdate},
};

/// Public appointment form; also used by managers taking bookings by phone
pub async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<BookingInput>,
) -> Result<impl IntoResponse> {
    let booking = state.bookings.create_booking(input).await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_bookings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let bookings = state.bookings.get_bookings().await?;

    Ok((StatusCode::OK, Json(bookings)))
}

pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<BookingUpdate>,
) -> Result<impl IntoResponse> {
    let booking = state.bookings.update_booking(id, update).await?;

    Ok((StatusCode::OK, Json(booking)))
}
