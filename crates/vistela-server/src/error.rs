//! Server-specific error types

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::db::StoreError;

/// Application error types
///
/// Every feature error funnels through here on its way to an HTTP response,
/// so the status mapping lives in one place.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Object storage unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    /// HTTP status, stable error code and client-facing message
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Store(StoreError::DuplicateKey(_)) => {
                (StatusCode::CONFLICT, "CONFLICT", self.to_string())
            },
            AppError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            },
            AppError::Store(StoreError::Validation(_)) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string())
            },
            AppError::Store(StoreError::StorageUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_UNAVAILABLE",
                "The video store is temporarily unavailable".to_string(),
            ),
            AppError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "OBJECT_STORAGE_UNAVAILABLE",
                "Object storage is temporarily unavailable".to_string(),
            ),
            AppError::Store(StoreError::Database(_)) | AppError::Store(StoreError::Config(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
            ),
        }
    }
}

/// Bodies that are not JSON, lack a field or carry the wrong type
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
