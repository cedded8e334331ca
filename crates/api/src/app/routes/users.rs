use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use prediction_accounts::{NewUser, UserPatch};
use prediction_core::UserId;

use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::context::PrincipalContext;

use super::{USER_DETAIL, USER_LIST};

pub fn router() -> Router {
    Router::new()
        .route(USER_LIST, get(list_users).post(create_user))
        .route(
            USER_DETAIL,
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
}

/// GET /users/ - newest members first.
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let users = services.store().list_users().await?;
    let items: Vec<_> = users.iter().map(dto::user_to_json).collect();
    Ok((StatusCode::OK, Json(items)).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::UserRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let new = NewUser::from_input(body.into_input()?)?;

    let user = services.store().create_user(new, Utc::now()).await?;
    tracing::info!(
        actor = %principal.principal_id(),
        actor_name = principal.username().unwrap_or_default(),
        user_id = %user.id,
        username = %user.username,
        "user created"
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, dto::user_link(user.id))],
        Json(dto::user_to_json(&user)),
    )
        .into_response())
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: UserId = id.parse()?;
    let user = services.store().get_user(id).await?;
    Ok((StatusCode::OK, Json(dto::user_to_json(&user))).into_response())
}

/// PUT /users/:id/ - full update; `username` is required.
pub async fn replace_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UserRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_user(services, principal, id, body, false).await
}

/// PATCH /users/:id/ - only the fields present are changed.
pub async fn patch_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UserRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_user(services, principal, id, body, true).await
}

async fn update_user(
    services: Arc<AppServices>,
    principal: PrincipalContext,
    id: String,
    body: Result<Json<dto::UserRequest>, JsonRejection>,
    partial: bool,
) -> Result<Response, ApiError> {
    let id: UserId = id.parse()?;
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let patch = UserPatch::from_input(body.into_input()?, partial)?;

    let user = services.store().update_user(id, patch).await?;
    tracing::info!(actor = %principal.principal_id(), user_id = %user.id, partial, "user updated");
    Ok((StatusCode::OK, Json(dto::user_to_json(&user))).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: UserId = id.parse()?;
    services.store().delete_user(id).await?;
    tracing::info!(
        actor = %principal.principal_id(),
        actor_name = principal.username().unwrap_or_default(),
        user_id = %id,
        "user deleted"
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}
