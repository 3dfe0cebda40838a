use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use common::types::Page;
use models::contact_message;
use service::contact_service;

use super::{auth::ServerState, PageQuery};
use crate::{errors::JsonApiError, extract::AdminUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ContactCreated {
    pub id: Uuid,
}

#[utoipa::path(post, path = "/api/contact", tag = "contact", request_body = ContactRequest,
    responses((status = 201, description = "Stored"), (status = 400, description = "Bad Request")))]
pub async fn submit(State(state): State<ServerState>, Json(input): Json<ContactRequest>) -> Result<(StatusCode, Json<ContactCreated>), JsonApiError> {
    let stored = contact_service::submit(&state.db, &input.name, &input.email, &input.subject, &input.message).await?;
    Ok((StatusCode::CREATED, Json(ContactCreated { id: stored.id })))
}

#[utoipa::path(get, path = "/api/contact", tag = "contact", params(PageQuery),
    responses((status = 200, description = "Messages, newest first"), (status = 403, description = "Forbidden")))]
pub async fn list(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<contact_message::Model>>, JsonApiError> {
    Ok(Json(contact_service::list_messages(&state.db, page.into()).await?))
}

#[utoipa::path(put, path = "/api/contact/{id}/handled", tag = "contact", params(("id" = Uuid, Path, description = "Message id")),
    responses((status = 200, description = "Marked handled"), (status = 404, description = "Not Found")))]
pub async fn mark_handled(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<contact_message::Model>, JsonApiError> {
    Ok(Json(contact_service::mark_handled(&state.db, id).await?))
}

#[utoipa::path(delete, path = "/api/contact/{id}", tag = "contact", params(("id" = Uuid, Path, description = "Message id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    contact_service::delete_message(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
