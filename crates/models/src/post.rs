use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{category, user, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Uuid,
    pub published: bool,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Category, Author }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
            Relation::Author => Entity::belongs_to(user::Entity)
                .from(Column::AuthorId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Validated field set for a new post. The slug is resolved by the caller.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Uuid,
    pub published: bool,
}

pub fn validate_title(title: &str) -> Result<String, ModelError> { validate::text("title", title, 1, 200) }

pub fn validate_content(content: &str) -> Result<String, ModelError> { validate::text("content", content, 1, 200_000) }

pub fn validate_excerpt(excerpt: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text("excerpt", excerpt, 500)
}

pub fn validate_cover_image(url: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_url("cover_image", url)
}

pub async fn create(db: &DatabaseConnection, input: NewPost) -> Result<Model, errors::ModelError> {
    let title = validate_title(&input.title)?;
    let slug = validate::slug(&input.slug)?;
    let content = validate_content(&input.content)?;
    let excerpt = validate_excerpt(input.excerpt.as_deref())?;
    let cover_image = validate_cover_image(input.cover_image.as_deref())?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        slug: Set(slug),
        excerpt: Set(excerpt),
        content: Set(content),
        cover_image: Set(cover_image),
        category_id: Set(input.category_id),
        author_id: Set(input.author_id),
        published: Set(input.published),
        published_at: Set(input.published.then_some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Slug.eq(slug)).one(db).await?)
}

pub async fn slug_taken(db: &DatabaseConnection, slug: &str, except: Option<Uuid>) -> Result<bool, errors::ModelError> {
    let mut q = Entity::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except { q = q.filter(Column::Id.ne(id)); }
    Ok(q.count(db).await? > 0)
}
