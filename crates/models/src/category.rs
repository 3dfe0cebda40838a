use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::validate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<String, ModelError> { validate::text("name", name, 1, 128) }

pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text("description", description, 2000)
}

pub async fn create(db: &DatabaseConnection, name: &str, slug: &str, description: Option<&str>) -> Result<Model, errors::ModelError> {
    let name = validate_name(name)?;
    let slug = validate::slug(slug)?;
    let description = validate_description(description)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(description),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Slug.eq(slug)).one(db).await?)
}

/// True when another category (not `except`) already uses `slug`.
pub async fn slug_taken(db: &DatabaseConnection, slug: &str, except: Option<Uuid>) -> Result<bool, errors::ModelError> {
    let mut q = Entity::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except { q = q.filter(Column::Id.ne(id)); }
    Ok(q.count(db).await? > 0)
}
