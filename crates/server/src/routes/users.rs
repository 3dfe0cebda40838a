use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use common::types::Page;
use models::user;
use service::user_service::{self, AdminUserUpdate};

use super::{auth::ServerState, PageQuery};
use crate::{errors::JsonApiError, extract::AdminUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    /// `user` or `admin`.
    pub role: Option<String>,
}

#[utoipa::path(get, path = "/api/users", tag = "users", params(PageQuery),
    responses((status = 200, description = "Active users"), (status = 403, description = "Forbidden")))]
pub async fn list(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<user::Model>>, JsonApiError> {
    Ok(Json(user_service::list_users(&state.db, page.into()).await?))
}

#[utoipa::path(get, path = "/api/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "User"), (status = 404, description = "Not Found")))]
pub async fn get(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(user_service::get_user(&state.db, id).await?))
}

#[utoipa::path(put, path = "/api/users/{id}", tag = "users", request_body = UpdateUserRequest, params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "Updated"), (status = 400, description = "Bad Request"), (status = 404, description = "Not Found")))]
pub async fn update(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserRequest>,
) -> Result<Json<user::Model>, JsonApiError> {
    let update = AdminUserUpdate { name: input.name, role: input.role };
    Ok(Json(user_service::admin_update_user(&state.db, id, update).await?))
}

#[utoipa::path(delete, path = "/api/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")),
    responses((status = 204, description = "Soft deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    user_service::soft_delete_user(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
