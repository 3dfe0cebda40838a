use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "webhook_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider: String,
    pub event_id: String,
    pub event_type: String,
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    pub processed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn find<C: ConnectionTrait>(db: &C, provider: &str, event_id: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find()
        .filter(Column::Provider.eq(provider))
        .filter(Column::EventId.eq(event_id))
        .one(db)
        .await?)
}

/// Record a delivery; a concurrent duplicate surfaces as `ModelError::Conflict`.
pub async fn create(db: &DatabaseConnection, provider: &str, event_id: &str, event_type: &str, payload: &str) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        provider: Set(provider.to_string()),
        event_id: Set(event_id.to_string()),
        event_type: Set(event_type.to_string()),
        payload: Set(payload.to_string()),
        processed_at: Set(None),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

pub async fn mark_processed<C: ConnectionTrait>(db: &C, existing: Model) -> Result<Model, errors::ModelError> {
    let mut am: ActiveModel = existing.into();
    am.processed_at = Set(Some(Utc::now().into()));
    Ok(am.update(db).await?)
}
