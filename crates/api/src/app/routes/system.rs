use axum::{http::StatusCode, Json};

use crate::app::errors::ApiError;

use super::reverse;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET / - links to the resource collections.
pub async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "users": reverse("user-list"),
        "groups": reverse("group-list"),
    }))
}

/// Fallback for paths no route matches, authenticated or not.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
