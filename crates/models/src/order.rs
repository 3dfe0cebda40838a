use sea_orm::{entity::prelude::*, ConnectionTrait, QuerySelect, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{user, validate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub provider: String,
    pub provider_order_id: String,
    pub status: String,
    pub total_cents: i64,
    pub currency: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    LemonSqueezy,
    FastSpring,
    Manual,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::LemonSqueezy => "lemonsqueezy",
            Provider::FastSpring => "fastspring",
            Provider::Manual => "manual",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Refunded,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ModelError::validation("status must be one of pending, paid, refunded, cancelled")),
        }
    }

    /// pending -> paid | cancelled, paid -> refunded; everything else is final.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Refunded)
        )
    }
}

impl Model {
    pub fn status(&self) -> Result<OrderStatus, ModelError> { OrderStatus::parse(&self.status) }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub provider: Provider,
    pub provider_order_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub currency: String,
}

/// Generic over the connection so it can run inside a transaction.
pub async fn create<C: ConnectionTrait>(db: &C, input: NewOrder) -> Result<Model, errors::ModelError> {
    let customer_email = validate::email(&input.customer_email)?;
    let provider_order_id = validate::text("provider_order_id", &input.provider_order_id, 1, 128)?;
    let currency = validate::currency(&input.currency)?;
    if input.total_cents < 0 {
        return Err(ModelError::validation("total_cents must be >= 0"));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(input.user_id),
        customer_email: Set(customer_email),
        provider: Set(input.provider.as_str().into()),
        provider_order_id: Set(provider_order_id),
        status: Set(input.status.as_str().into()),
        total_cents: Set(input.total_cents),
        currency: Set(currency),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Provider references are stored trimmed, so lookups trim too.
pub async fn find_by_provider_ref<C: ConnectionTrait>(db: &C, provider: Provider, provider_order_id: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find()
        .filter(Column::Provider.eq(provider.as_str()))
        .filter(Column::ProviderOrderId.eq(provider_order_id.trim()))
        .one(db)
        .await?)
}

/// `SELECT ... FOR UPDATE`; the row stays locked until the transaction ends.
pub async fn find_for_update<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find_by_id(id).lock_exclusive().one(db).await?)
}

pub async fn set_status<C: ConnectionTrait>(db: &C, existing: Model, status: OrderStatus) -> Result<Model, errors::ModelError> {
    let mut am: ActiveModel = existing.into();
    am.status = Set(status.as_str().into());
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Refunded));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Refunded.can_transition_to(Paid));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn status_round_trip_through_str() {
        for s in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Refunded, OrderStatus::Cancelled] {
            assert_eq!(OrderStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(OrderStatus::parse("shipped").is_err());
    }
}
