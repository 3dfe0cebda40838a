use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use common::types::Page;
use models::newsletter_subscriber;
use service::newsletter_service;

use super::{auth::ServerState, PageQuery};
use crate::{errors::JsonApiError, extract::AdminUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[utoipa::path(post, path = "/api/newsletter/subscribe", tag = "newsletter", request_body = EmailRequest,
    responses((status = 200, description = "Subscribed"), (status = 400, description = "Bad Request")))]
pub async fn subscribe(State(state): State<ServerState>, Json(input): Json<EmailRequest>) -> Result<Json<newsletter_subscriber::Model>, JsonApiError> {
    Ok(Json(newsletter_service::subscribe(&state.db, &input.email).await?))
}

#[utoipa::path(post, path = "/api/newsletter/unsubscribe", tag = "newsletter", request_body = EmailRequest,
    responses((status = 200, description = "Unsubscribed"), (status = 404, description = "Unknown address")))]
pub async fn unsubscribe(State(state): State<ServerState>, Json(input): Json<EmailRequest>) -> Result<Json<newsletter_subscriber::Model>, JsonApiError> {
    Ok(Json(newsletter_service::unsubscribe(&state.db, &input.email).await?))
}

#[utoipa::path(get, path = "/api/newsletter/subscribers", tag = "newsletter", params(PageQuery, StatusFilter),
    responses((status = 200, description = "Subscribers"), (status = 403, description = "Forbidden")))]
pub async fn list(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Page<newsletter_subscriber::Model>>, JsonApiError> {
    let subscribers = newsletter_service::list_subscribers(&state.db, filter.status.as_deref(), page.into()).await?;
    Ok(Json(subscribers))
}
