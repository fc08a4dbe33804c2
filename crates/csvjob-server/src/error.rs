//! Server-level error type for handlers outside the feature slices

use crate::api::response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Db(#[from] crate::db::DbError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_ERROR", "A database error occurred".to_string())
            },
            AppError::Db(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_ERROR", "A database error occurred".to_string())
            },
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "A storage error occurred".to_string())
            },
            AppError::NotFound(ref message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message.clone()),
            AppError::BadRequest(ref message) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message.clone())
            },
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
