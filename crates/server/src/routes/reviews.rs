use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use common::types::Page;
use models::review;
use service::review_service::{self, ReviewUpdate};

use super::{auth::ServerState, PageQuery};
use crate::{errors::JsonApiError, extract::CurrentUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    /// 1 to 5.
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[utoipa::path(get, path = "/api/templates/{id}/reviews", tag = "reviews", params(("id" = Uuid, Path, description = "Template id"), PageQuery),
    responses((status = 200, description = "Reviews, newest first"), (status = 404, description = "Unknown template")))]
pub async fn list(
    State(state): State<ServerState>,
    Path(template_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<review::Model>>, JsonApiError> {
    Ok(Json(review_service::list_for_template(&state.db, template_id, page.into()).await?))
}

#[utoipa::path(post, path = "/api/templates/{id}/reviews", tag = "reviews", request_body = CreateReviewRequest, params(("id" = Uuid, Path, description = "Template id")),
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 404, description = "Unknown template"), (status = 409, description = "Already reviewed")))]
pub async fn create(
    current: CurrentUser,
    State(state): State<ServerState>,
    Path(template_id): Path<Uuid>,
    Json(input): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<review::Model>), JsonApiError> {
    let created = review_service::create_review(&state.db, template_id, current.id, input.rating, input.comment.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/reviews/{id}", tag = "reviews", request_body = UpdateReviewRequest, params(("id" = Uuid, Path, description = "Review id")),
    responses((status = 200, description = "Updated"), (status = 403, description = "Not the author"), (status = 404, description = "Not Found")))]
pub async fn update(
    current: CurrentUser,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateReviewRequest>,
) -> Result<Json<review::Model>, JsonApiError> {
    let update = ReviewUpdate { rating: input.rating, comment: input.comment };
    Ok(Json(review_service::update_review(&state.db, id, current.id, update).await?))
}

#[utoipa::path(delete, path = "/api/reviews/{id}", tag = "reviews", params(("id" = Uuid, Path, description = "Review id")),
    responses((status = 204, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn delete(current: CurrentUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    review_service::delete_review(&state.db, id, current.id, current.is_admin()).await?;
    Ok(StatusCode::NO_CONTENT)
}
