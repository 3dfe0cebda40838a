use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use common::types::Page;
use models::order;
use service::order_service::{self, OrderDetail};

use super::{auth::ServerState, newsletter::StatusFilter, PageQuery};
use crate::{errors::JsonApiError, extract::{AdminUser, CurrentUser}};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusRequest {
    /// `pending`, `paid`, `refunded` or `cancelled`.
    pub status: String,
}

#[utoipa::path(get, path = "/api/orders", tag = "orders", params(PageQuery),
    responses((status = 200, description = "Own orders"), (status = 401, description = "Unauthorized")))]
pub async fn list_own(
    current: CurrentUser,
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<order::Model>>, JsonApiError> {
    Ok(Json(order_service::list_for_user(&state.db, current.id, &current.email, page.into()).await?))
}

/// Orders of other users answer 404.
#[utoipa::path(get, path = "/api/orders/{id}", tag = "orders", params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order with items"), (status = 404, description = "Not Found")))]
pub async fn get(current: CurrentUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<OrderDetail>, JsonApiError> {
    let detail = order_service::get_for_user(&state.db, id, current.id, &current.email, current.is_admin()).await?;
    Ok(Json(detail))
}

#[utoipa::path(get, path = "/api/admin/orders", tag = "orders", params(PageQuery, StatusFilter),
    responses((status = 200, description = "All orders"), (status = 403, description = "Forbidden")))]
pub async fn list_all(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Page<order::Model>>, JsonApiError> {
    Ok(Json(order_service::list_all(&state.db, filter.status.as_deref(), page.into()).await?))
}

#[utoipa::path(put, path = "/api/admin/orders/{id}/status", tag = "orders", request_body = OrderStatusRequest, params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Updated"), (status = 400, description = "Unknown status"), (status = 409, description = "Transition not allowed")))]
pub async fn update_status(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<OrderStatusRequest>,
) -> Result<Json<order::Model>, JsonApiError> {
    let updated = order_service::update_status(&state.db, id, &input.status, state.licenses.validity_days).await?;
    Ok(Json(updated))
}
