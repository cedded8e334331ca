use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use prediction_accounts::{GroupPatch, NewGroup};
use prediction_core::GroupId;

use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::context::PrincipalContext;

use super::{GROUP_DETAIL, GROUP_LIST};

pub fn router() -> Router {
    Router::new()
        .route(GROUP_LIST, get(list_groups).post(create_group))
        .route(
            GROUP_DETAIL,
            get(get_group)
                .put(replace_group)
                .patch(patch_group)
                .delete(delete_group),
        )
}

pub async fn list_groups(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let groups = services.store().list_groups().await?;
    let items: Vec<_> = groups.iter().map(dto::group_to_json).collect();
    Ok((StatusCode::OK, Json(items)).into_response())
}

pub async fn create_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::GroupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let new = NewGroup::from_input(body.into())?;

    let group = services.store().create_group(new).await?;
    tracing::info!(
        actor = %principal.principal_id(),
        actor_name = principal.username().unwrap_or_default(),
        group_id = %group.id,
        name = %group.name,
        "group created"
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, dto::group_link(group.id))],
        Json(dto::group_to_json(&group)),
    )
        .into_response())
}

pub async fn get_group(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: GroupId = id.parse()?;
    let group = services.store().get_group(id).await?;
    Ok((StatusCode::OK, Json(dto::group_to_json(&group))).into_response())
}

pub async fn replace_group(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::GroupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_group(services, id, body, false).await
}

pub async fn patch_group(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::GroupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_group(services, id, body, true).await
}

async fn update_group(
    services: Arc<AppServices>,
    id: String,
    body: Result<Json<dto::GroupRequest>, JsonRejection>,
    partial: bool,
) -> Result<Response, ApiError> {
    let id: GroupId = id.parse()?;
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let patch = GroupPatch::from_input(body.into(), partial)?;

    let group = services.store().update_group(id, patch).await?;
    Ok((StatusCode::OK, Json(dto::group_to_json(&group))).into_response())
}

/// DELETE /groups/:id/ - members lose the group reference.
pub async fn delete_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: GroupId = id.parse()?;
    services.store().delete_group(id).await?;
    tracing::info!(
        actor = %principal.principal_id(),
        actor_name = principal.username().unwrap_or_default(),
        group_id = %id,
        "group deleted"
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}
