use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{template, user, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub template_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Template, User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Template => Entity::belongs_to(template::Entity)
                .from(Column::TemplateId)
                .to(template::Column::Id)
                .into(),
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_rating(rating: i32) -> Result<i32, ModelError> {
    if !(1..=5).contains(&rating) {
        return Err(ModelError::validation("rating must be between 1 and 5"));
    }
    Ok(rating)
}

pub fn validate_comment(comment: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text("comment", comment, 2000)
}

/// Fails with `Conflict` when the user already reviewed the template.
pub async fn create(db: &DatabaseConnection, template_id: Uuid, user_id: Uuid, rating: i32, comment: Option<&str>) -> Result<Model, errors::ModelError> {
    let rating = validate_rating(rating)?;
    let comment = validate_comment(comment)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        template_id: Set(template_id),
        user_id: Set(user_id),
        rating: Set(rating),
        comment: Set(comment),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_template_and_user(db: &DatabaseConnection, template_id: Uuid, user_id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find()
        .filter(Column::TemplateId.eq(template_id))
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_range() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        for r in 1..=5 { assert_eq!(validate_rating(r).unwrap(), r); }
    }

    #[test]
    fn comment_length() {
        assert!(validate_comment(Some(&"x".repeat(2001))).is_err());
        assert_eq!(validate_comment(Some("  nice ")).unwrap().as_deref(), Some("nice"));
    }
}
