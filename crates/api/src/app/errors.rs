use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use prediction_core::{DomainError, FieldErrors};

/// Failures surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("not found")]
    NotFound,

    #[error("store failure: {0}")]
    Store(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(fields) => Self::Validation(fields),
            // Ids come from the resource path, so a bad one names no resource.
            DomainError::InvalidId(_) | DomainError::NotFound => Self::NotFound,
            DomainError::Storage(msg) => Self::Store(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                let mut res = json_error(StatusCode::UNAUTHORIZED, "unauthorized", self.to_string());
                res.headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                res
            }
            ApiError::InvalidBody(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_body", msg),
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "error": "validation_error",
                    "message": fields.to_string(),
                    "fields": fields,
                })),
            )
                .into_response(),
            ApiError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
            ApiError::Store(msg) => {
                tracing::error!(error = %msg, "store operation failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal storage error")
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
