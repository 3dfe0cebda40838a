//! FastSpring webhooks.
//!
//! One delivery batches several events: `{"events": [{"id", "type", "data"}]}`.
//! Each event is handled on its own; the ids that no longer need redelivery are
//! reported back in `processed`.

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, instrument, warn};

use models::order::{OrderStatus, Provider};
use models::template;
use crate::order_service::{self, PaidItem, PaidOrder};
use super::{claim, finish, id_string, signature, to_cents, Outcome, WebhookError, WebhookSettings};

pub const PROVIDER: &str = "fastspring";
pub const SIGNATURE_HEADER: &str = "x-fs-signature";

#[derive(Debug, Clone, Deserialize)]
pub struct FsBatch {
    pub events: Vec<FsEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FsEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

/// The parts of an `order.completed` payload we use.
#[derive(Debug, Clone, Deserialize)]
pub struct FsOrder {
    pub order: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub currency: Option<String>,
    /// Major units.
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub customer: Option<FsCustomer>,
    #[serde(default)]
    pub items: Vec<FsItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FsCustomer {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FsItem {
    pub product: String,
    /// Major units.
    #[serde(default)]
    pub subtotal: Option<f64>,
}

/// Per-delivery result returned to FastSpring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub processed: Vec<String>,
}

pub fn parse(body: &[u8]) -> Result<FsBatch, WebhookError> {
    let batch: FsBatch = serde_json::from_slice(body)?;
    if batch.events.iter().any(|e| e.id.trim().is_empty()) {
        return Err(WebhookError::Payload("event id missing".into()));
    }
    Ok(batch)
}

/// The order a `return.created` refers to.
pub fn returned_order_id(data: &Value) -> Option<String> {
    data.get("original")
        .and_then(|o| o.get("order").or_else(|| o.get("id")))
        .and_then(id_string)
        .or_else(|| data.get("order").and_then(id_string))
}

async fn order_completed(db: &DatabaseConnection, event: &FsEvent, settings: &WebhookSettings) -> Result<Outcome, WebhookError> {
    let fs: FsOrder = serde_json::from_value(event.data.clone())?;
    if !fs.completed {
        return Ok(Outcome::Ignored);
    }
    let mut items = Vec::with_capacity(fs.items.len());
    let mut currency = None;
    for item in &fs.items {
        match template::find_by_fastspring_product(db, &item.product).await? {
            Some(t) => {
                let price_cents = item.subtotal.map(to_cents).unwrap_or(t.price_cents);
                currency.get_or_insert(t.currency);
                items.push(PaidItem { template_id: t.id, price_cents });
            }
            None => warn!(order = %fs.order, product = %item.product, "order item matches no template"),
        }
    }
    if items.is_empty() {
        warn!(order = %fs.order, "completed order matches no template");
        return Ok(Outcome::Ignored);
    }
    let email = fs
        .customer
        .as_ref()
        .and_then(|c| c.email.clone())
        .ok_or_else(|| WebhookError::Payload("data.customer.email missing".into()))?;
    let total_cents = fs.total.map(to_cents).unwrap_or_else(|| items.iter().map(|i| i.price_cents).sum());
    let input = PaidOrder {
        provider: Provider::FastSpring,
        provider_order_id: fs.order.trim().to_string(),
        customer_email: email,
        currency: fs.currency.clone().or(currency).unwrap_or_else(|| "USD".into()),
        total_cents,
        items,
    };
    order_service::record_paid_order(db, input, settings.license_validity_days).await?;
    Ok(Outcome::Processed)
}

async fn return_created(db: &DatabaseConnection, event: &FsEvent) -> Result<Outcome, WebhookError> {
    let order_id = returned_order_id(&event.data).ok_or_else(|| WebhookError::Payload("return without order reference".into()))?;
    match order_service::refund_by_provider_ref(db, Provider::FastSpring, &order_id).await? {
        Some(o) if o.status == OrderStatus::Refunded.as_str() => Ok(Outcome::Processed),
        Some(_) => Ok(Outcome::Ignored),
        None => {
            warn!(%order_id, "return for unknown order");
            Ok(Outcome::Ignored)
        }
    }
}

async fn handle_event(db: &DatabaseConnection, event: &FsEvent, settings: &WebhookSettings) -> Result<Outcome, WebhookError> {
    let payload = event.data.to_string();
    let Some(row) = claim(db, PROVIDER, &event.id, &event.event_type, &payload).await? else {
        return Ok(Outcome::Duplicate);
    };
    let outcome = match event.event_type.as_str() {
        "order.completed" => order_completed(db, event, settings).await?,
        "return.created" => return_created(db, event).await?,
        _ => Outcome::Ignored,
    };
    finish(db, row, outcome).await
}

/// Verify the batch signature, then apply each event independently.
///
/// A failing event is left out of `processed` so FastSpring redelivers it;
/// the others still go through.
#[instrument(skip_all)]
pub async fn handle(db: &DatabaseConnection, settings: &WebhookSettings, signature: Option<&str>, body: &[u8]) -> Result<BatchResult, WebhookError> {
    let secret = settings.secret()?;
    signature::verify_base64(secret, body, signature)?;
    let batch = parse(body)?;

    let mut result = BatchResult::default();
    for event in &batch.events {
        match handle_event(db, event, settings).await {
            Ok(_) => result.processed.push(event.id.clone()),
            Err(e) => error!(event_id = %event.id, event_type = %event.event_type, error = %e, "fastspring event failed"),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_completed_order() {
        let body = serde_json::to_vec(&json!({
            "events": [{
                "id": "evt_1",
                "type": "order.completed",
                "live": false,
                "data": {
                    "order": "FS-ORDER-1",
                    "completed": true,
                    "currency": "EUR",
                    "total": 59.9,
                    "customer": { "email": "buyer@example.com" },
                    "items": [{ "product": "landing-kit", "quantity": 1, "subtotal": 59.9 }]
                }
            }]
        }))
        .unwrap();
        let batch = parse(&body).unwrap();
        assert_eq!(batch.events.len(), 1);
        let order: FsOrder = serde_json::from_value(batch.events[0].data.clone()).unwrap();
        assert!(order.completed);
        assert_eq!(order.items[0].product, "landing-kit");
        assert_eq!(order.total.map(to_cents), Some(5990));
    }

    #[test]
    fn return_reference_prefers_original_order() {
        assert_eq!(returned_order_id(&json!({ "original": { "order": "A" }, "order": "B" })).as_deref(), Some("A"));
        assert_eq!(returned_order_id(&json!({ "original": { "id": "C" } })).as_deref(), Some("C"));
        assert_eq!(returned_order_id(&json!({ "order": "B" })).as_deref(), Some("B"));
        assert_eq!(returned_order_id(&json!({ "return": "R" })), None);
    }

    #[test]
    fn rejects_batches_without_ids() {
        assert!(matches!(parse(br#"{"events":[{"id":"","type":"order.completed"}]}"#), Err(WebhookError::Payload(_))));
        assert!(matches!(parse(br#"{"nope":1}"#), Err(WebhookError::Payload(_))));
    }

    #[tokio::test]
    async fn unsigned_batches_are_rejected() {
        let db = DatabaseConnection::Disconnected;
        let settings = WebhookSettings { secret: Some("fs-secret".into()), license_validity_days: None };
        let body = br#"{"events":[]}"#;
        assert!(matches!(handle(&db, &settings, None, body).await, Err(WebhookError::MissingSignature)));
        let forged = signature::sign_base64("other", body).unwrap();
        assert!(matches!(handle(&db, &settings, Some(&forged), body).await, Err(WebhookError::InvalidSignature)));

        let sig = signature::sign_base64("fs-secret", body).unwrap();
        let empty = handle(&db, &settings, Some(&sig), body).await.unwrap();
        assert!(empty.processed.is_empty());
    }

    #[tokio::test]
    async fn batch_records_order_and_return() -> Result<(), anyhow::Error> {
        let Some(db) = crate::test_support::get_db().await? else { return Ok(()) };

        let product = format!("kit-{}", uuid::Uuid::new_v4().simple());
        crate::template_service::create_template(
            &db,
            crate::template_service::TemplateInput {
                title: format!("FS kit {product}"),
                slug: None,
                description: "Sold through FastSpring".into(),
                price_cents: 1999,
                currency: "USD".into(),
                preview_url: None,
                thumbnail_url: None,
                category_id: None,
                lemonsqueezy_variant_id: None,
                fastspring_product_path: Some(product.clone()),
                published: true,
            },
        )
        .await?;
        let order_ref = format!("FS-{}", uuid::Uuid::new_v4().simple());
        let completed_id = format!("evt-{}", uuid::Uuid::new_v4().simple());
        let body = serde_json::to_vec(&json!({ "events": [{
            "id": completed_id, "type": "order.completed",
            "data": { "order": order_ref, "completed": true, "currency": "USD", "total": 19.99,
                      "customer": { "email": "fs-buyer@example.com" },
                      "items": [{ "product": product, "subtotal": 19.99 }] }
        }]}))?;
        let settings = WebhookSettings { secret: Some("fs".into()), license_validity_days: None };
        let sig = signature::sign_base64("fs", &body)?;
        let res = handle(&db, &settings, Some(&sig), &body).await?;
        assert_eq!(res.processed, vec![completed_id.clone()]);
        let again = handle(&db, &settings, Some(&sig), &body).await?;
        assert_eq!(again.processed, vec![completed_id]);

        let order = models::order::find_by_provider_ref(&db, Provider::FastSpring, &order_ref).await?.unwrap();
        assert_eq!(order.total_cents, 1999);

        let return_id = format!("evt-{}", uuid::Uuid::new_v4().simple());
        let body = serde_json::to_vec(&json!({ "events": [{
            "id": return_id, "type": "return.created",
            "data": { "return": "R1", "original": { "order": order_ref } }
        }]}))?;
        let sig = signature::sign_base64("fs", &body)?;
        assert_eq!(handle(&db, &settings, Some(&sig), &body).await?.processed, vec![return_id]);
        let order = models::order::find_by_provider_ref(&db, Provider::FastSpring, &order_ref).await?.unwrap();
        assert_eq!(order.status, "refunded");
        Ok(())
    }
}
