use uuid::Uuid;
use serde::Serialize;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use tracing::{info, instrument, warn};

use common::{pagination::Pagination, types::Page};
use models::errors::ModelError;
use models::order::{self, OrderStatus, Provider};
use models::{license, order_item, user, validate};
use crate::{errors::ServiceError, license_service, pagination::fetch_page};

/// An order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

#[derive(Debug, Clone)]
pub struct PaidItem {
    pub template_id: Uuid,
    pub price_cents: i64,
}

/// A completed purchase as reported by a payment provider.
#[derive(Debug, Clone)]
pub struct PaidOrder {
    pub provider: Provider,
    pub provider_order_id: String,
    pub customer_email: String,
    pub currency: String,
    pub total_cents: i64,
    pub items: Vec<PaidItem>,
}

#[derive(Debug, Clone)]
pub struct RecordedOrder {
    pub order: order::Model,
    pub licenses: Vec<license::Model>,
    /// False when the provider reference was already on file.
    pub created: bool,
}

fn owned_by(user_id: Uuid, email: &str) -> Condition {
    Condition::any()
        .add(order::Column::UserId.eq(user_id))
        .add(order::Column::CustomerEmail.eq(email.trim().to_lowercase()))
}

/// Orders placed by the user, or with their email before they registered.
pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid, email: &str, opts: Pagination) -> Result<Page<order::Model>, ServiceError> {
    let select = order::Entity::find()
        .filter(owned_by(user_id, email))
        .order_by_desc(order::Column::CreatedAt);
    fetch_page(db, select, opts).await
}

pub async fn get_order(db: &DatabaseConnection, id: Uuid) -> Result<OrderDetail, ServiceError> {
    let found = order::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("order"))?;
    let items = order_item::list_by_order(db, found.id).await?;
    Ok(OrderDetail { order: found, items })
}

/// Owners and admins only; others get the same 404 as a missing order.
pub async fn get_for_user(db: &DatabaseConnection, id: Uuid, user_id: Uuid, email: &str, is_admin: bool) -> Result<OrderDetail, ServiceError> {
    let detail = get_order(db, id).await?;
    let owner = detail.order.user_id == Some(user_id) || detail.order.customer_email == email.trim().to_lowercase();
    if !owner && !is_admin {
        return Err(ServiceError::not_found("order"));
    }
    Ok(detail)
}

pub async fn list_all(db: &DatabaseConnection, status: Option<&str>, opts: Pagination) -> Result<Page<order::Model>, ServiceError> {
    let mut select = order::Entity::find();
    if let Some(status) = status.filter(|s| !s.trim().is_empty()) {
        let status = OrderStatus::parse(status)?;
        select = select.filter(order::Column::Status.eq(status.as_str()));
    }
    fetch_page(db, select.order_by_desc(order::Column::CreatedAt), opts).await
}

/// Apply an allowed status transition. Paying issues licenses; refunding revokes them.
///
/// The order row is locked for the whole transaction, so concurrent changes
/// are checked against the status the winner left behind.
#[instrument(skip(db))]
pub async fn update_status(db: &DatabaseConnection, id: Uuid, status: &str, validity_days: Option<i64>) -> Result<order::Model, ServiceError> {
    let next = OrderStatus::parse(status)?;
    let txn = db.begin().await?;
    let Some(existing) = order::find_for_update(&txn, id).await? else {
        txn.rollback().await?;
        return Err(ServiceError::not_found("order"));
    };
    let current = existing.status()?;
    if !current.can_transition_to(next) {
        txn.rollback().await?;
        return Err(ServiceError::Conflict(format!(
            "cannot move order from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let updated = order::set_status(&txn, existing, next).await?;
    match next {
        OrderStatus::Paid => {
            if license_service::list_for_order(&txn, updated.id).await?.is_empty() {
                for item in order_item::list_by_order(&txn, updated.id).await? {
                    license_service::issue(&txn, &updated, item.template_id, validity_days).await?;
                }
            }
        }
        OrderStatus::Refunded => {
            let revoked = license::revoke_by_order(&txn, updated.id).await?;
            info!(order_id = %updated.id, revoked, "licenses revoked on refund");
        }
        OrderStatus::Pending | OrderStatus::Cancelled => {}
    }
    txn.commit().await?;
    info!(order_id = %updated.id, from = current.as_str(), to = next.as_str(), "order status changed");
    Ok(updated)
}

async fn existing_recorded(db: &DatabaseConnection, found: order::Model) -> Result<RecordedOrder, ServiceError> {
    let licenses = license_service::list_for_order(db, found.id).await?;
    Ok(RecordedOrder { order: found, licenses, created: false })
}

/// Record a paid order with one license per item.
///
/// Redelivery of the same `(provider, provider_order_id)` returns the stored
/// order untouched.
#[instrument(skip(db, input), fields(provider = input.provider.as_str(), provider_order_id = %input.provider_order_id))]
pub async fn record_paid_order(db: &DatabaseConnection, input: PaidOrder, validity_days: Option<i64>) -> Result<RecordedOrder, ServiceError> {
    if input.items.is_empty() {
        return Err(ServiceError::validation("order has no items"));
    }
    if let Some(found) = order::find_by_provider_ref(db, input.provider, &input.provider_order_id).await? {
        return existing_recorded(db, found).await;
    }
    let email = validate::email(&input.customer_email)?;
    let user_id = user::find_by_email(db, &email).await?.filter(|u| !u.is_deleted()).map(|u| u.id);

    let txn = db.begin().await?;
    let created = order::create(
        &txn,
        order::NewOrder {
            user_id,
            customer_email: email,
            provider: input.provider,
            provider_order_id: input.provider_order_id.clone(),
            status: OrderStatus::Paid,
            total_cents: input.total_cents,
            currency: input.currency,
        },
    )
    .await;
    let created = match created {
        Ok(o) => o,
        Err(ModelError::Conflict(_)) => {
            // lost a race with a concurrent delivery
            txn.rollback().await?;
            warn!("order recorded concurrently");
            let found = order::find_by_provider_ref(db, input.provider, &input.provider_order_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("order"))?;
            return existing_recorded(db, found).await;
        }
        Err(e) => return Err(e.into()),
    };
    let mut licenses = Vec::with_capacity(input.items.len());
    for item in &input.items {
        order_item::create(&txn, created.id, item.template_id, item.price_cents).await?;
        licenses.push(license_service::issue(&txn, &created, item.template_id, validity_days).await?);
    }
    txn.commit().await?;
    info!(order_id = %created.id, items = input.items.len(), linked_user = user_id.is_some(), "paid order recorded");
    Ok(RecordedOrder { order: created, licenses, created: true })
}

/// Refund by provider reference. `None` when the order is unknown.
///
/// Only paid orders move to refunded; any other order comes back unchanged
/// so the caller can tell the refund was not applied.
#[instrument(skip(db))]
pub async fn refund_by_provider_ref(db: &DatabaseConnection, provider: Provider, provider_order_id: &str) -> Result<Option<order::Model>, ServiceError> {
    let Some(found) = order::find_by_provider_ref(db, provider, provider_order_id).await? else {
        return Ok(None);
    };
    let txn = db.begin().await?;
    let Some(locked) = order::find_for_update(&txn, found.id).await? else {
        txn.rollback().await?;
        return Ok(None);
    };
    let current = locked.status()?;
    if !current.can_transition_to(OrderStatus::Refunded) {
        txn.rollback().await?;
        if current != OrderStatus::Refunded {
            warn!(order_id = %locked.id, status = current.as_str(), "provider refund for an order that is not paid");
        }
        return Ok(Some(locked));
    }
    let updated = order::set_status(&txn, locked, OrderStatus::Refunded).await?;
    let revoked = license::revoke_by_order(&txn, updated.id).await?;
    txn.commit().await?;
    info!(order_id = %updated.id, revoked, "order refunded by provider");
    Ok(Some(updated))
}
