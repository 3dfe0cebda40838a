use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use common::types::Page;
use models::template;
use service::template_service::{self, TemplateInput, TemplateQuery, TemplateSummary, TemplateUpdate};

use super::{auth::ServerState, clearable_id, posts::ListFilter, PageQuery};
use crate::{errors::JsonApiError, extract::AdminUser};

fn default_currency() -> String { "USD".into() }

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub price_cents: i64,
    /// ISO 4217 code, defaults to USD.
    #[serde(default = "default_currency")]
    pub currency: String,
    pub preview_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub lemonsqueezy_variant_id: Option<String>,
    pub fastspring_product_path: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub preview_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// `null` or `""` removes the category.
    #[serde(default, deserialize_with = "clearable_id")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub category_id: Option<Option<Uuid>>,
    pub lemonsqueezy_variant_id: Option<String>,
    pub fastspring_product_path: Option<String>,
    pub published: Option<bool>,
}

#[utoipa::path(get, path = "/api/templates", tag = "templates", params(PageQuery, ListFilter),
    responses((status = 200, description = "Published templates with rating aggregates")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Page<TemplateSummary>>, JsonApiError> {
    let query = TemplateQuery { category: filter.category, search: filter.search };
    Ok(Json(template_service::list_published(&state.db, query, page.into()).await?))
}

#[utoipa::path(get, path = "/api/templates/{slug}", tag = "templates", params(("slug" = String, Path, description = "Template slug")),
    responses((status = 200, description = "Template"), (status = 404, description = "Not Found")))]
pub async fn get_by_slug(State(state): State<ServerState>, Path(slug): Path<String>) -> Result<Json<TemplateSummary>, JsonApiError> {
    Ok(Json(template_service::get_published_by_slug(&state.db, &slug).await?))
}

#[utoipa::path(post, path = "/api/templates", tag = "templates", request_body = CreateTemplateRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn create(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Json(input): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<template::Model>), JsonApiError> {
    let input = TemplateInput {
        title: input.title,
        slug: input.slug,
        description: input.description,
        price_cents: input.price_cents,
        currency: input.currency,
        preview_url: input.preview_url,
        thumbnail_url: input.thumbnail_url,
        category_id: input.category_id,
        lemonsqueezy_variant_id: input.lemonsqueezy_variant_id,
        fastspring_product_path: input.fastspring_product_path,
        published: input.published,
    };
    let created = template_service::create_template(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/templates/{id}", tag = "templates", request_body = UpdateTemplateRequest, params(("id" = Uuid, Path, description = "Template id")),
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found")))]
pub async fn update(
    _admin: AdminUser,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTemplateRequest>,
) -> Result<Json<template::Model>, JsonApiError> {
    let update = TemplateUpdate {
        title: input.title,
        slug: input.slug,
        description: input.description,
        price_cents: input.price_cents,
        currency: input.currency,
        preview_url: input.preview_url,
        thumbnail_url: input.thumbnail_url,
        category_id: input.category_id,
        lemonsqueezy_variant_id: input.lemonsqueezy_variant_id,
        fastspring_product_path: input.fastspring_product_path,
        published: input.published,
    };
    Ok(Json(template_service::update_template(&state.db, id, update).await?))
}

#[utoipa::path(delete, path = "/api/templates/{id}", tag = "templates", params(("id" = Uuid, Path, description = "Template id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"), (status = 409, description = "Template has orders")))]
pub async fn delete(_admin: AdminUser, State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    template_service::delete_template(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
