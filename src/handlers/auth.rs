use axum::{
    extract::{Json, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, Result},
    handlers::AppState,
    models::user::{AuthUser, Role, SignInInput, SignUpInput},
};

/// Handler for signing in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> Result<impl IntoResponse> {
    let response = state.auth.login(input).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// Handler for creating an account
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<SignUpInput>,
) -> Result<impl IntoResponse> {
    let response = state.auth.register(input).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Resolve the bearer token into an `AuthUser` request extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("missing bearer token".into()))?;

    let claims = state.auth.verify_token(token)?;
    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}

pub async fn require_manager(req: Request, next: Next) -> Result<Response> {
    require_role(req, next, Role::Manager).await
}

pub async fn require_worker(req: Request, next: Next) -> Result<Response> {
    require_role(req, next, Role::Worker).await
}

async fn require_role(req: Request, next: Next, role: Role) -> Result<Response> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Auth("not authenticated".into()))?;

    if user.role != role {
        tracing::warn!(user_id = user.user_id, ?role, "role check failed");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
