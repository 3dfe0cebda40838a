use uuid::Uuid;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::review;
use crate::{errors::ServiceError, pagination::fetch_page, template_service};

#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// Reviews of one template, newest first.
pub async fn list_for_template(db: &DatabaseConnection, template_id: Uuid, opts: Pagination) -> Result<Page<review::Model>, ServiceError> {
    template_service::get_template(db, template_id).await?;
    let select = review::Entity::find()
        .filter(review::Column::TemplateId.eq(template_id))
        .order_by_desc(review::Column::CreatedAt);
    fetch_page(db, select, opts).await
}

/// One review per user and template.
#[instrument(skip(db, comment))]
pub async fn create_review(
    db: &DatabaseConnection,
    template_id: Uuid,
    user_id: Uuid,
    rating: i32,
    comment: Option<&str>,
) -> Result<review::Model, ServiceError> {
    review::validate_rating(rating)?;
    template_service::get_template(db, template_id).await?;
    if review::find_by_template_and_user(db, template_id, user_id).await?.is_some() {
        return Err(ServiceError::Conflict("you already reviewed this template".into()));
    }
    let created = review::create(db, template_id, user_id, rating, comment).await?;
    info!(id = %created.id, rating, "created review");
    Ok(created)
}

async fn get_review(db: &DatabaseConnection, id: Uuid) -> Result<review::Model, ServiceError> {
    review::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("review"))
}

#[instrument(skip(db, update))]
pub async fn update_review(db: &DatabaseConnection, id: Uuid, user_id: Uuid, update: ReviewUpdate) -> Result<review::Model, ServiceError> {
    let existing = get_review(db, id).await?;
    if existing.user_id != user_id {
        return Err(ServiceError::Forbidden("only the author can edit a review".into()));
    }
    let rating = update.rating.map(review::validate_rating).transpose()?;
    let comment = update.comment.as_deref().map(|c| review::validate_comment(Some(c))).transpose()?;
    let mut am: review::ActiveModel = existing.into();
    if let Some(rating) = rating { am.rating = Set(rating); }
    if let Some(comment) = comment { am.comment = Set(comment); }
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

#[instrument(skip(db))]
pub async fn delete_review(db: &DatabaseConnection, id: Uuid, user_id: Uuid, is_admin: bool) -> Result<(), ServiceError> {
    let existing = get_review(db, id).await?;
    if existing.user_id != user_id && !is_admin {
        return Err(ServiceError::Forbidden("only the author or an admin can delete a review".into()));
    }
    review::Entity::delete_by_id(id).exec(db).await?;
    info!(%id, "deleted review");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template_service::{create_template, delete_template, TemplateInput};
    use crate::test_support::get_db;
    use models::user;

    #[tokio::test]
    async fn ownership_rules() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let t = create_template(
            &db,
            TemplateInput {
                title: format!("Blog theme {}", Uuid::new_v4().simple()),
                slug: None,
                description: "Minimal".into(),
                price_cents: 0,
                currency: "USD".into(),
                preview_url: None,
                thumbnail_url: None,
                category_id: None,
                lemonsqueezy_variant_id: None,
                fastspring_product_path: None,
                published: true,
            },
        )
        .await?;
        let owner = user::create(&db, "Owner", &format!("{}@example.com", Uuid::new_v4()), user::Role::User).await?;
        let other = user::create(&db, "Other", &format!("{}@example.com", Uuid::new_v4()), user::Role::User).await?;

        assert!(matches!(create_review(&db, Uuid::new_v4(), owner.id, 5, None).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(create_review(&db, t.id, owner.id, 6, None).await, Err(ServiceError::Validation(_))));

        let r = create_review(&db, t.id, owner.id, 3, Some("ok")).await?;
        assert!(matches!(create_review(&db, t.id, owner.id, 4, None).await, Err(ServiceError::Conflict(_))));

        let denied = update_review(&db, r.id, other.id, ReviewUpdate { rating: Some(1), ..Default::default() }).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
        let edited = update_review(&db, r.id, owner.id, ReviewUpdate { rating: Some(4), comment: Some(String::new()) }).await?;
        assert_eq!(edited.rating, 4);
        assert!(edited.comment.is_none());

        assert!(matches!(delete_review(&db, r.id, other.id, false).await, Err(ServiceError::Forbidden(_))));
        delete_review(&db, r.id, other.id, true).await?;
        assert_eq!(list_for_template(&db, t.id, Pagination::default()).await?.total, 0);

        delete_template(&db, t.id).await?;
        user::hard_delete(&db, owner.id).await?;
        user::hard_delete(&db, other.id).await?;
        Ok(())
    }
}
