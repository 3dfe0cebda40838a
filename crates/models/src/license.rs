use sea_orm::{entity::prelude::*, sea_query::Expr, Set, ConnectionTrait};
use uuid::Uuid;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{order, template, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "license")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub license_key: String,
    pub order_id: Uuid,
    pub template_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub status: String,
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Order, Template, User }

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
pub enum LicenseStatus {
    Active,
    Revoked,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Active => "active",
            LicenseStatus::Revoked => "revoked",
        }
    }
}

impl Model {
    pub fn is_expired_at(&self, now: DateTime<FixedOffset>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }

    /// Active and not past its expiry.
    pub fn is_valid_at(&self, now: DateTime<FixedOffset>) -> bool {
        self.status == LicenseStatus::Active.as_str() && !self.is_expired_at(now)
    }
}

/// `XXXX-XXXX-XXXX-XXXX` over `[A-Z0-9]`.
pub fn validate_key_format(key: &str) -> Result<(), ModelError> {
    let groups: Vec<&str> = key.split('-').collect();
    let ok = groups.len() == 4
        && groups
            .iter()
            .all(|g| g.len() == 4 && g.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    if ok { Ok(()) } else { Err(ModelError::validation("malformed license key")) }
}

#[derive(Debug, Clone)]
pub struct NewLicense {
    pub license_key: String,
    pub order_id: Uuid,
    pub template_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub expires_at: Option<DateTimeWithTimeZone>,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewLicense) -> Result<Model, errors::ModelError> {
    validate_key_format(&input.license_key)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        license_key: Set(input.license_key),
        order_id: Set(input.order_id),
        template_id: Set(input.template_id),
        user_id: Set(input.user_id),
        customer_email: Set(input.customer_email),
        status: Set(LicenseStatus::Active.as_str().into()),
        expires_at: Set(input.expires_at),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_key<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::LicenseKey.eq(key)).one(db).await?)
}

/// Revoke every active license of an order; returns how many changed.
pub async fn revoke_by_order<C: ConnectionTrait>(db: &C, order_id: Uuid) -> Result<u64, errors::ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Status, Expr::value(LicenseStatus::Revoked.as_str()))
        .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(Column::OrderId.eq(order_id))
        .filter(Column::Status.eq(LicenseStatus::Active.as_str()))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(status: LicenseStatus, expires_at: Option<DateTimeWithTimeZone>) -> Model {
        let now: DateTimeWithTimeZone = Utc::now().into();
        Model {
            id: Uuid::new_v4(),
            license_key: "ABCD-EFGH-1234-5678".into(),
            order_id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            user_id: None,
            customer_email: "buyer@example.com".into(),
            status: status.as_str().into(),
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn key_format() {
        assert!(validate_key_format("ABCD-EFGH-1234-5678").is_ok());
        assert!(validate_key_format("abcd-EFGH-1234-5678").is_err());
        assert!(validate_key_format("ABCD-EFGH-1234").is_err());
        assert!(validate_key_format("ABCDE-FGH-1234-5678").is_err());
    }

    #[test]
    fn validity_respects_status_and_expiry() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        assert!(sample(LicenseStatus::Active, None).is_valid_at(now));
        assert!(sample(LicenseStatus::Active, Some(now + Duration::days(1))).is_valid_at(now));
        assert!(!sample(LicenseStatus::Active, Some(now - Duration::seconds(1))).is_valid_at(now));
        assert!(!sample(LicenseStatus::Revoked, None).is_valid_at(now));
    }
}
