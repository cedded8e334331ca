//! Model endpoints.
//!
//! Both handlers are placeholders: they accept any request and answer `true`.

use axum::{http::StatusCode, Json};

/// GET /train_model/
pub async fn train_model() -> (StatusCode, Json<bool>) {
    tracing::debug!("train_model requested");
    (StatusCode::OK, Json(true))
}

/// GET /predict/
pub async fn predict() -> (StatusCode, Json<bool>) {
    tracing::debug!("predict requested");
    (StatusCode::OK, Json(true))
}
