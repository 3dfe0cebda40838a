use uuid::Uuid;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::{category, validate};
use crate::{errors::ServiceError, pagination::fetch_page, slugs::unique_slug};

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Absent fields are left untouched; a blank description clears it.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

pub async fn list_categories(db: &DatabaseConnection, opts: Pagination) -> Result<Page<category::Model>, ServiceError> {
    fetch_page(db, category::Entity::find().order_by_asc(category::Column::Name), opts).await
}

pub async fn get_by_slug(db: &DatabaseConnection, slug: &str) -> Result<category::Model, ServiceError> {
    category::find_by_slug(db, slug).await?.ok_or_else(|| ServiceError::not_found("category"))
}

pub async fn get_category(db: &DatabaseConnection, id: Uuid) -> Result<category::Model, ServiceError> {
    category::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("category"))
}

/// Explicit slugs must be canonical and free; generated ones get a numeric suffix.
async fn resolve_slug(db: &DatabaseConnection, explicit: Option<&str>, source: &str, except: Option<Uuid>) -> Result<String, ServiceError> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            let s = validate::slug(s)?;
            if category::slug_taken(db, &s, except).await? {
                return Err(ServiceError::Conflict(format!("slug '{s}' already in use")));
            }
            Ok(s)
        }
        None => unique_slug(source, |s| async move { category::slug_taken(db, &s, except).await }).await,
    }
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_category(db: &DatabaseConnection, input: CategoryInput) -> Result<category::Model, ServiceError> {
    let name = category::validate_name(&input.name)?;
    let slug = resolve_slug(db, input.slug.as_deref(), &name, None).await?;
    let created = category::create(db, &name, &slug, input.description.as_deref()).await?;
    info!(id = %created.id, slug = %created.slug, "created category");
    Ok(created)
}

#[instrument(skip(db, update))]
pub async fn update_category(db: &DatabaseConnection, id: Uuid, update: CategoryUpdate) -> Result<category::Model, ServiceError> {
    let existing = get_category(db, id).await?;
    let name = update.name.as_deref().map(category::validate_name).transpose()?;
    let slug = match (update.slug.as_deref(), name.as_deref()) {
        (Some(explicit), _) => Some(resolve_slug(db, Some(explicit), &existing.name, Some(id)).await?),
        (None, Some(new_name)) if new_name != existing.name => Some(resolve_slug(db, None, new_name, Some(id)).await?),
        _ => None,
    };
    let description = update.description.as_deref().map(|d| category::validate_description(Some(d))).transpose()?;

    let mut am: category::ActiveModel = existing.into();
    if let Some(name) = name { am.name = Set(name); }
    if let Some(slug) = slug { am.slug = Set(slug); }
    if let Some(description) = description { am.description = Set(description); }
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

/// Posts and templates in the category keep existing with no category.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = category::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("category"));
    }
    info!(%id, "deleted category");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn slugs_are_generated_and_deduplicated() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let name = format!("Cat {}", Uuid::new_v4().simple());
        let a = create_category(&db, CategoryInput { name: name.clone(), slug: None, description: None }).await?;
        let b = create_category(&db, CategoryInput { name: name.clone(), slug: None, description: Some("x".into()) }).await?;
        assert_eq!(b.slug, format!("{}-2", a.slug));

        let explicit = create_category(&db, CategoryInput { name: "Other".into(), slug: Some(a.slug.clone()), description: None }).await;
        assert!(matches!(explicit, Err(ServiceError::Conflict(_))));

        let renamed = update_category(&db, b.id, CategoryUpdate { name: Some(format!("{name} renamed")), ..Default::default() }).await?;
        assert!(renamed.slug.ends_with("-renamed"));
        let cleared = update_category(&db, b.id, CategoryUpdate { description: Some(String::new()), ..Default::default() }).await?;
        assert!(cleared.description.is_none());

        assert_eq!(get_by_slug(&db, &a.slug).await?.id, a.id);
        delete_category(&db, a.id).await?;
        delete_category(&db, b.id).await?;
        assert!(matches!(delete_category(&db, a.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
