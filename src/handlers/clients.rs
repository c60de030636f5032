use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::client::{ClientInput, NewCar},
};

pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> Result<impl IntoResponse> {
    let client = state.clients.create_client(input).await?;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_all_clients(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let clients = state.clients.get_all_clients().await?;

    Ok((StatusCode::OK, Json(clients)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let client = state.clients.get_client(id).await?;

    Ok((StatusCode::OK, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ClientInput>,
) -> Result<impl IntoResponse> {
    let client = state.clients.update_client(id, input).await?;

    Ok((StatusCode::OK, Json(client)))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.clients.delete_client(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_client_cars(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let cars = state.clients.get_client_cars(id).await?;

    Ok((StatusCode::OK, Json(cars)))
}

pub async fn add_car_to_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(car): Json<NewCar>,
) -> Result<impl IntoResponse> {
    let car = state.clients.add_car_to_client(id, car).await?;

    Ok((StatusCode::CREATED, Json(car)))
}

/// Rows parsed from an uploaded vehicle sheet
pub async fn import_vehicles(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(cars): Json<Vec<NewCar>>,
) -> Result<impl IntoResponse> {
    let report = state.clients.import_vehicles(id, cars).await?;

    Ok((StatusCode::OK, Json(report)))
}

pub async fn get_client_types(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let types = state.clients.get_client_types().await?;

    Ok((StatusCode::OK, Json(types)))
}

pub async fn whose_car(
    State(state): State<AppState>,
    Path(car): Path<String>,
) -> Result<impl IntoResponse> {
    let clients = state.clients.whose_car(&car).await?;

    Ok((StatusCode::OK, Json(clients)))
}

pub async fn compare_clients_for_car(
    State(state): State<AppState>,
    Path(car): Path<String>,
) -> Result<impl IntoResponse> {
    let comparison = state.clients.compare_clients_for_car(&car).await?;

    Ok((StatusCode::OK, Json(comparison)))
}
