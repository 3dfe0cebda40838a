use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use common::types::Page;
use models::license;
use service::license_service::{self, LicenseVerification};

use super::{auth::ServerState, PageQuery};
use crate::{errors::JsonApiError, extract::{AdminUser, CurrentUser}};

#[utoipa::path(get, path = "/api/licenses", tag = "licenses", params(PageQuery),
    responses((status = 200, description = "Own licenses"), (status = 401, description = "Unauthorized")))]
pub async fn list_own(
    current: CurrentUser,
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<license::Model>>, JsonApiError> {
    Ok(Json(license_service::list_for_user(&state.db, current.id, &current.email, page.into()).await?))
}

#[utoipa::path(get, path = "/api/licenses/verify/{key}", tag = "licenses", params(("key" = String, Path, description = "License key")),
    responses((status = 200, description = "Verification result"), (status = 400, description = "Malformed key"), (status = 404, description = "Unknown key")))]
pub async fn verify(State(state): State<ServerState>, Path(key): Path<String>) -> Result<Json<LicenseVerification>, JsonApiError> {
    Ok(Json(license_service::verify(&state.db, &key).await?))
}

#[utoipa::path(put, path = "/api/admin/licenses/{id}/revoke", tag = "licenses", params(("id" = Uuid, Path, description = "License id")),
    responses((status = 200, description = "Revoked"), (status = 404, description = "Not Found")))]
pub async fn revoke(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<license::Model>, JsonApiError> {
    Ok(Json(license_service::revoke(&state.db, id).await?))
}
