use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::Result,
    handlers::AppState,
    models::{
        user::AuthUser,
        worker::{LedgerInput, WorkerInput},
    },
    services::worker_service::parse_instant,
};

#[derive(Debug, Deserialize)]
pub struct SalaryQuery {
    /// First day of the 24h window, `YYYY-MM-DD` or RFC 3339
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: String,
    pub end: String,
}

pub async fn create_worker(
    State(state): State<AppState>,
    Json(input): Json<WorkerInput>,
) -> Result<impl IntoResponse> {
    let worker = state.workers.create_worker(input).await?;

    Ok((StatusCode::CREATED, Json(worker)))
}

pub async fn get_all_workers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let workers = state.workers.get_all_workers().await?;

    Ok((StatusCode::OK, Json(workers)))
}

pub async fn get_worker(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let worker = state.workers.get_worker(id).await?;

    Ok((StatusCode::OK, Json(worker)))
}

pub async fn update_worker(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<WorkerInput>,
) -> Result<impl IntoResponse> {
    let worker = state.workers.update_worker(id, input).await?;

    Ok((StatusCode::OK, Json(worker)))
}

pub async fn delete_worker(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.workers.delete_worker(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_penalty(
    State(state): State<AppState>,
    Json(input): Json<LedgerInput>,
) -> Result<impl IntoResponse> {
    let entry = state.workers.add_penalty(input).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_penalties(
    State(state): State<AppState>,
    Path(worker_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let entries = state.workers.get_penalties(worker_id).await?;

    Ok((StatusCode::OK, Json(entries)))
}

pub async fn add_bonus(
    State(state): State<AppState>,
    Json(input): Json<LedgerInput>,
) -> Result<impl IntoResponse> {
    let entry = state.workers.add_bonus(input).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_bonuses(
    State(state): State<AppState>,
    Path(worker_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let entries = state.workers.get_bonuses(worker_id).await?;

    Ok((StatusCode::OK, Json(entries)))
}

pub async fn get_worker_statistics(
    State(state): State<AppState>,
    Path(worker_id): Path<i64>,
    Query(range): Query<RangeQuery>,
) -> Result<impl IntoResponse> {
    let start = parse_instant(&range.start)?;
    let end = parse_instant(&range.end)?;
    let stats = state
        .workers
        .get_worker_statistics(worker_id, start, end)
        .await?;

    Ok((StatusCode::OK, Json(stats)))
}

pub async fn get_salary(
    State(state): State<AppState>,
    Path(worker_id): Path<i64>,
    Query(query): Query<SalaryQuery>,
) -> Result<impl IntoResponse> {
    let report = state
        .workers
        .salary(worker_id, parse_instant(&query.date)?)
        .await?;

    Ok((StatusCode::OK, Json(report)))
}

pub async fn get_own_salary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SalaryQuery>,
) -> Result<impl IntoResponse> {
    let report = state
        .workers
        .own_salary(&user, parse_instant(&query.date)?)
        .await?;

    Ok((StatusCode::OK, Json(report)))
}
