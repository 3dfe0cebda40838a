use sea_orm::{entity::prelude::*, Set, ConnectionTrait};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::{order, template};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub template_id: Uuid,
    pub price_cents: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Order, Template }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Order => Entity::belongs_to(order::Entity)
                .from(Column::OrderId)
                .to(order::Column::Id)
                .into(),
            Relation::Template => Entity::belongs_to(template::Entity)
                .from(Column::TemplateId)
                .to(template::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, order_id: Uuid, template_id: Uuid, price_cents: i64) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        template_id: Set(template_id),
        price_cents: Set(price_cents.max(0)),
    };
    Ok(am.insert(db).await?)
}

pub async fn list_by_order<C: ConnectionTrait>(db: &C, order_id: Uuid) -> Result<Vec<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::OrderId.eq(order_id)).all(db).await?)
}
