use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "newsletter_subscriber")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub status: String,
    pub subscribed_at: DateTimeWithTimeZone,
    pub unsubscribed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Subscribed,
    Unsubscribed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Subscribed => "subscribed",
            SubscriptionStatus::Unsubscribed => "unsubscribed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "subscribed" => Ok(Self::Subscribed),
            "unsubscribed" => Ok(Self::Unsubscribed),
            _ => Err(ModelError::validation("status must be 'subscribed' or 'unsubscribed'")),
        }
    }
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

/// Insert a fresh subscription; `email` must already be normalized.
pub async fn create(db: &DatabaseConnection, email: &str) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        status: Set(SubscriptionStatus::Subscribed.as_str().into()),
        subscribed_at: Set(Utc::now().into()),
        unsubscribed_at: Set(None),
    };
    Ok(am.insert(db).await?)
}

pub async fn set_status(db: &DatabaseConnection, existing: Model, status: SubscriptionStatus) -> Result<Model, errors::ModelError> {
    let mut am: ActiveModel = existing.into();
    let now = Utc::now().into();
    am.status = Set(status.as_str().into());
    match status {
        SubscriptionStatus::Subscribed => {
            am.subscribed_at = Set(now);
            am.unsubscribed_at = Set(None);
        }
        SubscriptionStatus::Unsubscribed => am.unsubscribed_at = Set(Some(now)),
    }
    Ok(am.update(db).await?)
}
