use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use qrlink_core::{ConflictField, QrError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] QrError),
    #[error("missing user identity")]
    Unauthorized,
    #[error("invalid CSRF token")]
    Forbidden,
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<ConflictField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
            value: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Core(QrError::NotFound) => (StatusCode::NOT_FOUND, ErrorBody::new("Not found")),
            AppError::Core(QrError::Conflict { field, value }) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: format!("{field} is already in use"),
                    field: Some(field),
                    value: Some(value),
                },
            ),
            AppError::Core(QrError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(message))
            }
            AppError::Core(QrError::Inactive) => (StatusCode::GONE, ErrorBody::new("Inactive")),
            AppError::Core(QrError::Storage(source)) => {
                error!(error = %source, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error"),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody::new("Unauthorized")),
            AppError::Forbidden => (StatusCode::FORBIDDEN, ErrorBody::new("Invalid CSRF token")),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorBody::new(message)),
            AppError::Internal(message) => {
                error!(error = %message, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
