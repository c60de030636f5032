use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::{
        contract::NewContract,
        service::{ContractServiceInput, NewService, ServiceUpdate},
    },
};

pub async fn create_contract(
    State(state): State<AppState>,
    Json(contract): Json<NewContract>,
) -> Result<impl IntoResponse> {
    let contract = state.catalog.create_contract(contract).await?;

    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn get_all_contracts(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let contracts = state.catalog.get_all_contracts().await?;

    Ok((StatusCode::OK, Json(contracts)))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let contract = state.catalog.get_contract(id).await?;

    Ok((StatusCode::OK, Json(contract)))
}

pub async fn add_services_to_contract(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(services): Json<Vec<ContractServiceInput>>,
) -> Result<impl IntoResponse> {
    let services = state.catalog.add_services_to_contract(id, services).await?;

    Ok((StatusCode::CREATED, Json(services)))
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(service): Json<NewService>,
) -> Result<impl IntoResponse> {
    let service = state.catalog.create_service(service).await?;

    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn get_all_services(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let services = state.catalog.get_all_services().await?;

    Ok((StatusCode::OK, Json(services)))
}

pub async fn get_service_prices_by_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let services = state
        .catalog
        .get_service_prices_by_contract(contract_id)
        .await?;

    Ok((StatusCode::OK, Json(services)))
}

/// Catalog grouped by service name, one price per contract
pub async fn get_all_with_prices(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let families = state.catalog.get_all_with_prices().await?;

    Ok((StatusCode::OK, Json(families)))
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ServiceUpdate>,
) -> Result<impl IntoResponse> {
    let service = state.catalog.update_service(id, update).await?;

    Ok((StatusCode::OK, Json(service)))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.catalog.delete_service(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
