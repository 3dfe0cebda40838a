use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use common::types::Page;
use models::post;
use service::post_service::{self, PostInput, PostQuery, PostUpdate};

use super::{auth::ServerState, clearable_id, PageQuery};
use crate::{errors::JsonApiError, extract::AdminUser};

/// Listing filters shared by posts and templates.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive title match.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    /// `null` or `""` removes the category.
    #[serde(default, deserialize_with = "clearable_id")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub category_id: Option<Option<Uuid>>,
    pub published: Option<bool>,
}

#[utoipa::path(get, path = "/api/posts", tag = "posts", params(PageQuery, ListFilter),
    responses((status = 200, description = "Published posts, newest first")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Page<post::Model>>, JsonApiError> {
    let query = PostQuery { category: filter.category, search: filter.search };
    Ok(Json(post_service::list_published(&state.db, query, page.into()).await?))
}

#[utoipa::path(get, path = "/api/posts/{slug}", tag = "posts", params(("slug" = String, Path, description = "Post slug")),
    responses((status = 200, description = "Post"), (status = 404, description = "Not Found")))]
pub async fn get_by_slug(State(state): State<ServerState>, Path(slug): Path<String>) -> Result<Json<post::Model>, JsonApiError> {
    Ok(Json(post_service::get_published_by_slug(&state.db, &slug).await?))
}

#[utoipa::path(post, path = "/api/posts", tag = "posts", request_body = CreatePostRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn create(
    AdminUser(admin): AdminUser,
    State(state): State<ServerState>,
    Json(input): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<post::Model>), JsonApiError> {
    let input = PostInput {
        title: input.title,
        slug: input.slug,
        excerpt: input.excerpt,
        content: input.content,
        cover_image: input.cover_image,
        category_id: input.category_id,
        published: input.published,
    };
    let created = post_service::create_post(&state.db, admin.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/posts/{id}", tag = "posts", request_body = UpdatePostRequest, params(("id" = Uuid, Path, description = "Post id")),
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found")))]
pub async fn update(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePostRequest>,
) -> Result<Json<post::Model>, JsonApiError> {
    let update = PostUpdate {
        title: input.title,
        slug: input.slug,
        excerpt: input.excerpt,
        content: input.content,
        cover_image: input.cover_image,
        category_id: input.category_id,
        published: input.published,
    };
    Ok(Json(post_service::update_post(&state.db, id, update).await?))
}

#[utoipa::path(delete, path = "/api/posts/{id}", tag = "posts", params(("id" = Uuid, Path, description = "Post id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    post_service::delete_post(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
