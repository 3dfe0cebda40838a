//! Lemon Squeezy webhooks.
//!
//! Envelope: `{"meta": {"event_name", "custom_data"?}, "data": {"id", "attributes"}}`.
//! Deliveries carry no event id of their own, so `"{event_name}:{data.id}"`
//! keys the idempotency ledger.

use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};
use uuid::Uuid;

use models::order::{OrderStatus, Provider};
use models::template;
use crate::order_service::{self, PaidItem, PaidOrder};
use super::{claim, finish, id_string, signature, Outcome, WebhookError, WebhookSettings};

pub const PROVIDER: &str = "lemonsqueezy";
pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Clone, Deserialize)]
pub struct LsWebhook {
    pub meta: LsMeta,
    pub data: LsData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LsMeta {
    pub event_name: String,
    #[serde(default)]
    pub custom_data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LsData {
    pub id: Value,
    #[serde(default)]
    pub attributes: LsAttributes,
}

/// The order attributes we read; other resources simply leave them empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LsAttributes {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Cents.
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub first_order_item: Option<LsOrderItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LsOrderItem {
    #[serde(default)]
    pub variant_id: Option<Value>,
    /// Cents.
    #[serde(default)]
    pub price: Option<i64>,
}

impl LsWebhook {
    pub fn order_id(&self) -> Result<String, WebhookError> {
        id_string(&self.data.id).ok_or_else(|| WebhookError::Payload("data.id missing".into()))
    }

    pub fn event_id(&self) -> Result<String, WebhookError> {
        Ok(format!("{}:{}", self.meta.event_name, self.order_id()?))
    }

    pub fn variant_id(&self) -> Option<String> {
        self.data.attributes.first_order_item.as_ref()?.variant_id.as_ref().and_then(id_string)
    }

    /// `meta.custom_data.template_id`, as set on the checkout link.
    pub fn custom_template_id(&self) -> Option<Uuid> {
        let raw = self.meta.custom_data.as_ref()?.get("template_id")?.as_str()?;
        Uuid::parse_str(raw.trim()).ok()
    }

    pub fn is_paid(&self) -> bool { self.data.attributes.status.as_deref() == Some("paid") }
}

pub fn parse(body: &[u8]) -> Result<LsWebhook, WebhookError> {
    let hook: LsWebhook = serde_json::from_slice(body)?;
    if hook.meta.event_name.trim().is_empty() {
        return Err(WebhookError::Payload("meta.event_name missing".into()));
    }
    Ok(hook)
}

async fn resolve_template(db: &DatabaseConnection, hook: &LsWebhook) -> Result<Option<template::Model>, WebhookError> {
    if let Some(variant) = hook.variant_id() {
        if let Some(t) = template::find_by_lemonsqueezy_variant(db, &variant).await? {
            return Ok(Some(t));
        }
    }
    match hook.custom_template_id() {
        Some(id) => Ok(template::Entity::find_by_id(id).one(db).await.map_err(models::errors::ModelError::from)?),
        None => Ok(None),
    }
}

async fn order_created(db: &DatabaseConnection, hook: &LsWebhook, settings: &WebhookSettings) -> Result<Outcome, WebhookError> {
    if !hook.is_paid() {
        return Ok(Outcome::Ignored);
    }
    let order_id = hook.order_id()?;
    let Some(tpl) = resolve_template(db, hook).await? else {
        warn!(%order_id, variant = ?hook.variant_id(), "paid order matches no template");
        return Ok(Outcome::Ignored);
    };
    let attrs = &hook.data.attributes;
    let email = attrs
        .user_email
        .clone()
        .ok_or_else(|| WebhookError::Payload("data.attributes.user_email missing".into()))?;
    let price_cents = attrs.first_order_item.as_ref().and_then(|i| i.price).unwrap_or(tpl.price_cents);
    let input = PaidOrder {
        provider: Provider::LemonSqueezy,
        provider_order_id: order_id,
        customer_email: email,
        currency: attrs.currency.clone().unwrap_or_else(|| tpl.currency.clone()),
        total_cents: attrs.total.unwrap_or(price_cents),
        items: vec![PaidItem { template_id: tpl.id, price_cents }],
    };
    order_service::record_paid_order(db, input, settings.license_validity_days).await?;
    Ok(Outcome::Processed)
}

async fn order_refunded(db: &DatabaseConnection, hook: &LsWebhook) -> Result<Outcome, WebhookError> {
    let order_id = hook.order_id()?;
    match order_service::refund_by_provider_ref(db, Provider::LemonSqueezy, &order_id).await? {
        Some(o) if o.status == OrderStatus::Refunded.as_str() => Ok(Outcome::Processed),
        Some(_) => Ok(Outcome::Ignored),
        None => {
            warn!(%order_id, "refund for unknown order");
            Ok(Outcome::Ignored)
        }
    }
}

/// Verify, de-duplicate and apply one delivery.
#[instrument(skip_all)]
pub async fn handle(db: &DatabaseConnection, settings: &WebhookSettings, signature: Option<&str>, body: &[u8]) -> Result<Outcome, WebhookError> {
    let secret = settings.secret()?;
    signature::verify_hex(secret, body, signature)?;
    let hook = parse(body)?;
    let event_id = hook.event_id()?;
    let payload = String::from_utf8_lossy(body);

    let Some(row) = claim(db, PROVIDER, &event_id, &hook.meta.event_name, &payload).await? else {
        return Ok(Outcome::Duplicate);
    };
    let outcome = match hook.meta.event_name.as_str() {
        "order_created" => order_created(db, &hook, settings).await?,
        "order_refunded" => order_refunded(db, &hook).await?,
        _ => Outcome::Ignored,
    };
    finish(db, row, outcome).await
}
