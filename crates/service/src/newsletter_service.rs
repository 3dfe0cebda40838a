use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::newsletter_subscriber::{self as subscriber, SubscriptionStatus};
use models::validate;
use crate::{errors::ServiceError, pagination::fetch_page};

/// Subscribing an already subscribed address is a no-op; an unsubscribed one is reactivated.
#[instrument(skip(db))]
pub async fn subscribe(db: &DatabaseConnection, email: &str) -> Result<subscriber::Model, ServiceError> {
    let email = validate::email(email)?;
    match subscriber::find_by_email(db, &email).await? {
        Some(existing) if existing.status == SubscriptionStatus::Subscribed.as_str() => Ok(existing),
        Some(existing) => {
            info!(id = %existing.id, "resubscribed");
            Ok(subscriber::set_status(db, existing, SubscriptionStatus::Subscribed).await?)
        }
        None => {
            let created = subscriber::create(db, &email).await?;
            info!(id = %created.id, "subscribed");
            Ok(created)
        }
    }
}

#[instrument(skip(db))]
pub async fn unsubscribe(db: &DatabaseConnection, email: &str) -> Result<subscriber::Model, ServiceError> {
    let email = validate::email(email)?;
    let existing = subscriber::find_by_email(db, &email)
        .await?
        .ok_or_else(|| ServiceError::not_found("subscriber"))?;
    if existing.status == SubscriptionStatus::Unsubscribed.as_str() {
        return Ok(existing);
    }
    info!(id = %existing.id, "unsubscribed");
    Ok(subscriber::set_status(db, existing, SubscriptionStatus::Unsubscribed).await?)
}

pub async fn list_subscribers(db: &DatabaseConnection, status: Option<&str>, opts: Pagination) -> Result<Page<subscriber::Model>, ServiceError> {
    let mut select = subscriber::Entity::find();
    if let Some(status) = status.filter(|s| !s.trim().is_empty()) {
        let status = SubscriptionStatus::parse(status.trim())?;
        select = select.filter(subscriber::Column::Status.eq(status.as_str()));
    }
    fetch_page(db, select.order_by_desc(subscriber::Column::SubscribedAt), opts).await
}
