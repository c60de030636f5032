use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    handlers::AppState,
    models::inventory::{MaterialCardInput, MaterialInput, MaterialQuantities, QuantityChange},
};

pub async fn create_material_card(
    State(state): State<AppState>,
    Json(card): Json<MaterialCardInput>,
) -> Result<impl IntoResponse> {
    let card = state.inventory.create_material_card(card).await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_all_material_cards(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let cards = state.inventory.get_all_material_cards().await?;

    Ok((StatusCode::OK, Json(cards)))
}

pub async fn update_material_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(card): Json<MaterialCardInput>,
) -> Result<impl IntoResponse> {
    let card = state.inventory.update_material_card(id, card).await?;

    Ok((StatusCode::OK, Json(card)))
}

pub async fn delete_material_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.inventory.delete_material_card(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Consume one material card from storage
pub async fn spell_material(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let storage = state.inventory.spell_material(id).await?;

    Ok((StatusCode::OK, Json(storage)))
}

pub async fn get_storage(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let storage = state.inventory.get_storage().await?;

    Ok((StatusCode::OK, Json(storage)))
}

pub async fn add_delivery(
    State(state): State<AppState>,
    Json(delivery): Json<MaterialQuantities>,
) -> Result<impl IntoResponse> {
    let storage = state.inventory.add_delivery(delivery).await?;

    Ok((StatusCode::OK, Json(storage)))
}

pub async fn create_material(
    State(state): State<AppState>,
    Json(material): Json<MaterialInput>,
) -> Result<impl IntoResponse> {
    let material = state.inventory.create_material(material).await?;

    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn get_all_materials(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let materials = state.inventory.get_all_materials().await?;

    Ok((StatusCode::OK, Json(materials)))
}

pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let material = state.inventory.get_material(id).await?;

    Ok((StatusCode::OK, Json(material)))
}

pub async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(material): Json<MaterialInput>,
) -> Result<impl IntoResponse> {
    let material = state.inventory.update_material(id, material).await?;

    Ok((StatusCode::OK, Json(material)))
}

pub async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.inventory.delete_material(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_quantity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(change): Json<QuantityChange>,
) -> Result<impl IntoResponse> {
    let material = state.inventory.add_quantity(id, change.quantity).await?;

    Ok((StatusCode::OK, Json(material)))
}

pub async fn subtract_quantity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(change): Json<QuantityChange>,
) -> Result<impl IntoResponse> {
    let material = state.inventory.subtract_quantity(id, change.quantity).await?;

    Ok((StatusCode::OK, Json(material)))
}
