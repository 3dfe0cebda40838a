use std::collections::HashMap;

use uuid::Uuid;
use chrono::Utc;
use serde::Serialize;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::{category, order_item, review, template, validate};
use crate::{errors::ServiceError, pagination::fetch_page, post_service::title_like, slugs::unique_slug};

/// Public listing filters.
#[derive(Debug, Clone, Default)]
pub struct TemplateQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// A template with its review aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    #[serde(flatten)]
    pub template: template::Model,
    /// `None` until the first review.
    pub average_rating: Option<f64>,
    pub review_count: u64,
}

#[derive(Debug, Clone)]
pub struct TemplateInput {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub preview_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub lemonsqueezy_variant_id: Option<String>,
    pub fastspring_product_path: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub preview_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// `Some(None)` detaches the category.
    pub category_id: Option<Option<Uuid>>,
    pub lemonsqueezy_variant_id: Option<String>,
    pub fastspring_product_path: Option<String>,
    pub published: Option<bool>,
}

fn average(sum: i64, count: i64) -> Option<f64> {
    if count <= 0 {
        return None;
    }
    let avg = sum as f64 / count as f64;
    Some((avg * 100.0).round() / 100.0)
}

/// `(rating sum, review count)` per template, for the given ids only.
async fn rating_stats(db: &DatabaseConnection, ids: Vec<Uuid>) -> Result<HashMap<Uuid, (i64, i64)>, ServiceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64, i64)> = review::Entity::find()
        .select_only()
        .column(review::Column::TemplateId)
        .column_as(review::Column::Rating.sum(), "rating_sum")
        .column_as(review::Column::Id.count(), "review_count")
        .filter(review::Column::TemplateId.is_in(ids))
        .group_by(review::Column::TemplateId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(id, sum, count)| (id, (sum, count))).collect())
}

fn summarize(template: template::Model, stats: &HashMap<Uuid, (i64, i64)>) -> TemplateSummary {
    let (sum, count) = stats.get(&template.id).copied().unwrap_or((0, 0));
    TemplateSummary { template, average_rating: average(sum, count), review_count: count.max(0) as u64 }
}

/// Published templates, newest first, with ratings.
pub async fn list_published(db: &DatabaseConnection, query: TemplateQuery, opts: Pagination) -> Result<Page<TemplateSummary>, ServiceError> {
    let mut select = template::Entity::find().filter(template::Column::Published.eq(true));
    if let Some(slug) = query.category.as_deref().filter(|s| !s.trim().is_empty()) {
        match category::find_by_slug(db, slug.trim()).await? {
            Some(cat) => select = select.filter(template::Column::CategoryId.eq(cat.id)),
            None => {
                let opts = opts.normalized();
                return Ok(Page::new(Vec::new(), opts.page, opts.limit, 0));
            }
        }
    }
    if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col((template::Entity, template::Column::Title)))).like(title_like(term)),
        );
    }
    let page = fetch_page(db, select.order_by_desc(template::Column::CreatedAt), opts).await?;
    let stats = rating_stats(db, page.items.iter().map(|t| t.id).collect()).await?;
    Ok(page.map(|t| summarize(t, &stats)))
}

pub async fn get_published_by_slug(db: &DatabaseConnection, slug: &str) -> Result<TemplateSummary, ServiceError> {
    match template::find_by_slug(db, slug).await? {
        Some(t) if t.published => {
            let stats = rating_stats(db, vec![t.id]).await?;
            Ok(summarize(t, &stats))
        }
        _ => Err(ServiceError::not_found("template")),
    }
}

pub async fn get_template(db: &DatabaseConnection, id: Uuid) -> Result<template::Model, ServiceError> {
    template::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("template"))
}

async fn ensure_category(db: &DatabaseConnection, id: Option<Uuid>) -> Result<(), ServiceError> {
    if let Some(id) = id {
        if category::Entity::find_by_id(id).one(db).await?.is_none() {
            return Err(ServiceError::validation("category does not exist"));
        }
    }
    Ok(())
}

async fn resolve_slug(db: &DatabaseConnection, explicit: Option<&str>, source: &str, except: Option<Uuid>) -> Result<String, ServiceError> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            let s = validate::slug(s)?;
            if template::slug_taken(db, &s, except).await? {
                return Err(ServiceError::Conflict(format!("slug '{s}' already in use")));
            }
            Ok(s)
        }
        None => unique_slug(source, |s| async move { template::slug_taken(db, &s, except).await }).await,
    }
}

#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create_template(db: &DatabaseConnection, input: TemplateInput) -> Result<template::Model, ServiceError> {
    let title = template::validate_title(&input.title)?;
    ensure_category(db, input.category_id).await?;
    let slug = resolve_slug(db, input.slug.as_deref(), &title, None).await?;
    let created = template::create(
        db,
        template::NewTemplate {
            title,
            slug,
            description: input.description,
            price_cents: input.price_cents,
            currency: input.currency,
            preview_url: input.preview_url,
            thumbnail_url: input.thumbnail_url,
            category_id: input.category_id,
            lemonsqueezy_variant_id: input.lemonsqueezy_variant_id,
            fastspring_product_path: input.fastspring_product_path,
            published: input.published,
        },
    )
    .await?;
    info!(id = %created.id, slug = %created.slug, "created template");
    Ok(created)
}

#[instrument(skip(db, update))]
pub async fn update_template(db: &DatabaseConnection, id: Uuid, update: TemplateUpdate) -> Result<template::Model, ServiceError> {
    let existing = get_template(db, id).await?;
    let title = update.title.as_deref().map(template::validate_title).transpose()?;
    let description = update.description.as_deref().map(template::validate_description).transpose()?;
    let price_cents = update.price_cents.map(template::validate_price).transpose()?;
    let currency = update.currency.as_deref().map(validate::currency).transpose()?;
    let preview_url = update.preview_url.as_deref().map(|u| validate::optional_url("preview_url", Some(u))).transpose()?;
    let thumbnail_url = update.thumbnail_url.as_deref().map(|u| validate::optional_url("thumbnail_url", Some(u))).transpose()?;
    let variant = update
        .lemonsqueezy_variant_id
        .as_deref()
        .map(|v| template::validate_provider_ref("lemonsqueezy_variant_id", Some(v)))
        .transpose()?;
    let product = update
        .fastspring_product_path
        .as_deref()
        .map(|v| template::validate_provider_ref("fastspring_product_path", Some(v)))
        .transpose()?;
    ensure_category(db, update.category_id.flatten()).await?;
    let slug = match (update.slug.as_deref(), title.as_deref()) {
        (Some(explicit), _) => Some(resolve_slug(db, Some(explicit), &existing.title, Some(id)).await?),
        (None, Some(t)) if t != existing.title => Some(resolve_slug(db, None, t, Some(id)).await?),
        _ => None,
    };

    let mut am: template::ActiveModel = existing.into();
    if let Some(v) = title { am.title = Set(v); }
    if let Some(v) = slug { am.slug = Set(v); }
    if let Some(v) = description { am.description = Set(v); }
    if let Some(v) = price_cents { am.price_cents = Set(v); }
    if let Some(v) = currency { am.currency = Set(v); }
    if let Some(v) = preview_url { am.preview_url = Set(v); }
    if let Some(v) = thumbnail_url { am.thumbnail_url = Set(v); }
    if let Some(v) = update.category_id { am.category_id = Set(v); }
    if let Some(v) = variant { am.lemonsqueezy_variant_id = Set(v); }
    if let Some(v) = product { am.fastspring_product_path = Set(v); }
    if let Some(v) = update.published { am.published = Set(v); }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(id = %updated.id, "updated template");
    Ok(updated)
}

/// Templates that were sold cannot be deleted; unpublish them instead.
#[instrument(skip(db))]
pub async fn delete_template(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    get_template(db, id).await?;
    let sold = order_item::Entity::find()
        .filter(order_item::Column::TemplateId.eq(id))
        .count(db)
        .await?;
    if sold > 0 {
        return Err(ServiceError::Conflict("template has orders; unpublish it instead".into()));
    }
    template::Entity::delete_by_id(id).exec(db).await?;
    info!(%id, "deleted template");
    Ok(())
}
