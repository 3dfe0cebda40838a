use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use common::types::Page;
use models::category;
use service::category_service::{self, CategoryInput, CategoryUpdate};

use super::{auth::ServerState, PageQuery};
use crate::{errors::JsonApiError, extract::AdminUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    /// Generated from `name` when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[utoipa::path(get, path = "/api/categories", tag = "categories", params(PageQuery),
    responses((status = 200, description = "Categories by name")))]
pub async fn list(State(state): State<ServerState>, Query(page): Query<PageQuery>) -> Result<Json<Page<category::Model>>, JsonApiError> {
    Ok(Json(category_service::list_categories(&state.db, page.into()).await?))
}

#[utoipa::path(get, path = "/api/categories/{slug}", tag = "categories", params(("slug" = String, Path, description = "Category slug")),
    responses((status = 200, description = "Category"), (status = 404, description = "Not Found")))]
pub async fn get_by_slug(State(state): State<ServerState>, Path(slug): Path<String>) -> Result<Json<category::Model>, JsonApiError> {
    Ok(Json(category_service::get_by_slug(&state.db, &slug).await?))
}

#[utoipa::path(post, path = "/api/categories", tag = "categories", request_body = CreateCategoryRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn create(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Json(input): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<category::Model>), JsonApiError> {
    let input = CategoryInput { name: input.name, slug: input.slug, description: input.description };
    let created = category_service::create_category(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/categories/{id}", tag = "categories", request_body = UpdateCategoryRequest, params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Conflict")))]
pub async fn update(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCategoryRequest>,
) -> Result<Json<category::Model>, JsonApiError> {
    let update = CategoryUpdate { name: input.name, slug: input.slug, description: input.description };
    Ok(Json(category_service::update_category(&state.db, id, update).await?))
}

#[utoipa::path(delete, path = "/api/categories/{id}", tag = "categories", params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    category_service::delete_category(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
