use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    handlers::AppState,
    models::{
        order::{OrderInput, StatusUpdate},
        user::AuthUser,
    },
    services::worker_service::parse_instant,
};

/// Optional `[start, end)` filter on a worker's orders
#[derive(Debug, Deserialize)]
pub struct RangeFilter {
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<OrderInput>,
) -> Result<impl IntoResponse> {
    let order = state.orders.create_order(&user, input).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_all_orders(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let orders = state.orders.get_all_orders().await?;

    Ok((StatusCode::OK, Json(orders)))
}

pub async fn get_own_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let orders = state.orders.get_own_orders(&user).await?;

    Ok((StatusCode::OK, Json(orders)))
}

pub async fn get_orders_by_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<i64>,
    Query(filter): Query<RangeFilter>,
) -> Result<impl IntoResponse> {
    let orders = match (filter.start, filter.end) {
        (Some(start), Some(end)) => {
            state
                .orders
                .get_orders_by_worker_in_range(worker_id, parse_instant(&start)?, parse_instant(&end)?)
                .await?
        }
        (None, None) => state.orders.get_orders_by_worker(worker_id).await?,
        _ => return Err(AppError::validation("start and end must be given together")),
    };

    Ok((StatusCode::OK, Json(orders)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let order = state.orders.get_order(id).await?;

    Ok((StatusCode::OK, Json(order)))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<OrderInput>,
) -> Result<impl IntoResponse> {
    let order = state.orders.update_order(id, input).await?;

    Ok((StatusCode::OK, Json(order)))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<impl IntoResponse> {
    let order = state.orders.update_order_status(id, update.status).await?;

    Ok((StatusCode::OK, Json(order)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.orders.delete_order(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_statistics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.orders.get_statistics().await?;

    Ok((StatusCode::OK, Json(stats)))
}
