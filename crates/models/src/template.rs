use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{category, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub preview_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub lemonsqueezy_variant_id: Option<String>,
    pub fastspring_product_path: Option<String>,
    pub published: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Category }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub title: String,
    pub slug: String,
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

pub fn validate_title(title: &str) -> Result<String, ModelError> { validate::text("title", title, 1, 200) }

pub fn validate_description(description: &str) -> Result<String, ModelError> {
    validate::text("description", description, 1, 20_000)
}

pub fn validate_price(price_cents: i64) -> Result<i64, ModelError> {
    if price_cents < 0 {
        return Err(ModelError::validation("price_cents must be >= 0"));
    }
    Ok(price_cents)
}

/// Matches the width of both provider reference columns.
pub const PROVIDER_REF_MAX: usize = 128;

pub fn validate_provider_ref(field: &str, value: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text(field, value, PROVIDER_REF_MAX)
}

pub async fn create(db: &DatabaseConnection, input: NewTemplate) -> Result<Model, errors::ModelError> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(validate_title(&input.title)?),
        slug: Set(validate::slug(&input.slug)?),
        description: Set(validate_description(&input.description)?),
        price_cents: Set(validate_price(input.price_cents)?),
        currency: Set(validate::currency(&input.currency)?),
        preview_url: Set(validate::optional_url("preview_url", input.preview_url.as_deref())?),
        thumbnail_url: Set(validate::optional_url("thumbnail_url", input.thumbnail_url.as_deref())?),
        category_id: Set(input.category_id),
        lemonsqueezy_variant_id: Set(validate_provider_ref("lemonsqueezy_variant_id", input.lemonsqueezy_variant_id.as_deref())?),
        fastspring_product_path: Set(validate_provider_ref("fastspring_product_path", input.fastspring_product_path.as_deref())?),
        published: Set(input.published),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Slug.eq(slug)).one(db).await?)
}

pub async fn find_by_lemonsqueezy_variant(db: &DatabaseConnection, variant_id: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::LemonsqueezyVariantId.eq(variant_id)).one(db).await?)
}

pub async fn find_by_fastspring_product(db: &DatabaseConnection, product_path: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::FastspringProductPath.eq(product_path)).one(db).await?)
}

pub async fn slug_taken(db: &DatabaseConnection, slug: &str, except: Option<Uuid>) -> Result<bool, errors::ModelError> {
    let mut q = Entity::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except { q = q.filter(Column::Id.ne(id)); }
    Ok(q.count(db).await? > 0)
}
