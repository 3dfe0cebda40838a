use uuid::Uuid;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Serialize;
use sea_orm::{
    prelude::DateTimeWithTimeZone, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::license::{self, LicenseStatus};
use models::order;
use crate::{errors::ServiceError, pagination::fetch_page};

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const KEY_GROUPS: usize = 4;
const GROUP_LEN: usize = 4;

/// Answer of the public verification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseVerification {
    pub valid: bool,
    pub status: String,
    pub template_id: Uuid,
    pub expires_at: Option<DateTimeWithTimeZone>,
}

/// Random `XXXX-XXXX-XXXX-XXXX` key.
pub fn generate_key() -> String {
    let mut rng = rand::thread_rng();
    (0..KEY_GROUPS)
        .map(|_| {
            (0..GROUP_LEN)
                .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

pub fn expiry_from(validity_days: Option<i64>) -> Option<DateTimeWithTimeZone> {
    validity_days.map(|days| (Utc::now() + Duration::days(days)).into())
}

/// Issue one active license for a template bought in `ord`.
pub(crate) async fn issue<C: ConnectionTrait>(
    conn: &C,
    ord: &order::Model,
    template_id: Uuid,
    validity_days: Option<i64>,
) -> Result<license::Model, ServiceError> {
    let mut key = generate_key();
    while license::find_by_key(conn, &key).await?.is_some() {
        key = generate_key();
    }
    let created = license::create(
        conn,
        license::NewLicense {
            license_key: key,
            order_id: ord.id,
            template_id,
            user_id: ord.user_id,
            customer_email: ord.customer_email.clone(),
            expires_at: expiry_from(validity_days),
        },
    )
    .await?;
    info!(license_id = %created.id, order_id = %ord.id, %template_id, "license issued");
    Ok(created)
}

pub async fn list_for_order<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> Result<Vec<license::Model>, ServiceError> {
    Ok(license::Entity::find()
        .filter(license::Column::OrderId.eq(order_id))
        .order_by_asc(license::Column::CreatedAt)
        .all(conn)
        .await?)
}

/// Licenses owned by the user, or bought with their email before they registered.
pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid, email: &str, opts: Pagination) -> Result<Page<license::Model>, ServiceError> {
    let select = license::Entity::find()
        .filter(
            Condition::any()
                .add(license::Column::UserId.eq(user_id))
                .add(license::Column::CustomerEmail.eq(email.trim().to_lowercase())),
        )
        .order_by_desc(license::Column::CreatedAt);
    fetch_page(db, select, opts).await
}

pub async fn verify(db: &DatabaseConnection, key: &str) -> Result<LicenseVerification, ServiceError> {
    let key = key.trim().to_ascii_uppercase();
    license::validate_key_format(&key)?;
    let found = license::find_by_key(db, &key)
        .await?
        .ok_or_else(|| ServiceError::not_found("license"))?;
    Ok(LicenseVerification {
        valid: found.is_valid_at(Utc::now().into()),
        status: found.status,
        template_id: found.template_id,
        expires_at: found.expires_at,
    })
}

#[instrument(skip(db))]
pub async fn revoke(db: &DatabaseConnection, id: Uuid) -> Result<license::Model, ServiceError> {
    let existing = license::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("license"))?;
    if existing.status == LicenseStatus::Revoked.as_str() {
        return Ok(existing);
    }
    let mut am: license::ActiveModel = existing.into();
    am.status = Set(LicenseStatus::Revoked.as_str().into());
    am.updated_at = Set(Utc::now().into());
    let revoked = am.update(db).await?;
    info!(license_id = %revoked.id, "license revoked");
    Ok(revoked)
}
