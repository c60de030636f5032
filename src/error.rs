use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Access denied")]
    Forbidden,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient {material} in storage: {available} available, {required} required")]
    InsufficientInventory {
        material: String,
        available: i64,
        required: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Turns a unique-key violation into a `Conflict`, anything else stays a database error.
    pub fn unique_or_database(err: sqlx::Error, conflict: impl Into<String>) -> Self {
        let unique = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            AppError::Conflict(conflict.into())
        } else {
            AppError::Database(err)
        }
    }

    /// Turns a foreign-key violation on delete into a `Conflict`.
    pub fn referenced_or_database(err: sqlx::Error, what: impl Into<String>) -> Self {
        let referenced = err
            .as_database_error()
            .is_some_and(|db| db.is_foreign_key_violation());
        if referenced {
            AppError::Conflict(format!("{} is still referenced", what.into()))
        } else {
            AppError::Database(err)
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InsufficientInventory { .. } => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Convert AppError to an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::Database(_) => "Database error".into(),
            AppError::Internal(_) => "Internal server error".into(),
            AppError::Json(_) => "JSON error".into(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(?self);
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type Result<T> = std::result::Result<T, AppError>;
