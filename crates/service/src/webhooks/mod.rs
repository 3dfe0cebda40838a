//! Payment provider webhooks: signature checks, payload parsing and the
//! idempotent application of order events.

pub mod signature;
pub mod lemonsqueezy;
pub mod fastspring;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use models::errors::ModelError;
use models::webhook_event;
use crate::errors::ServiceError;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook secret not configured")]
    NotConfigured,
    #[error("missing signature header")]
    MissingSignature,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<ModelError> for WebhookError {
    fn from(e: ModelError) -> Self { WebhookError::Service(e.into()) }
}

impl From<serde_json::Error> for WebhookError {
    fn from(e: serde_json::Error) -> Self { WebhookError::Payload(e.to_string()) }
}

/// What happened to one delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Side effects applied.
    Processed,
    /// Seen before; nothing done.
    Duplicate,
    /// Recorded but not actionable (unknown type, unpaid, no matching template).
    Ignored,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Processed => "processed",
            Outcome::Duplicate => "duplicate",
            Outcome::Ignored => "ignored",
        }
    }
}

/// Webhook processing knobs taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct WebhookSettings {
    pub secret: Option<String>,
    pub license_validity_days: Option<i64>,
}

impl WebhookSettings {
    pub(crate) fn secret(&self) -> Result<&str, WebhookError> {
        self.secret.as_deref().filter(|s| !s.is_empty()).ok_or(WebhookError::NotConfigured)
    }
}

/// Claim `(provider, event_id)` in the ledger.
///
/// `None` means the event was already processed. A stored but unprocessed row
/// (an earlier attempt failed midway) is handed back so the event is retried.
pub(crate) async fn claim(
    db: &DatabaseConnection,
    provider: &str,
    event_id: &str,
    event_type: &str,
    payload: &str,
) -> Result<Option<webhook_event::Model>, WebhookError> {
    if let Some(existing) = webhook_event::find(db, provider, event_id).await? {
        if existing.processed_at.is_some() {
            debug!(provider, event_id, "duplicate webhook event");
            return Ok(None);
        }
        return Ok(Some(existing));
    }
    match webhook_event::create(db, provider, event_id, event_type, payload).await {
        Ok(row) => Ok(Some(row)),
        Err(ModelError::Conflict(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn finish(db: &DatabaseConnection, row: webhook_event::Model, outcome: Outcome) -> Result<Outcome, WebhookError> {
    let row = webhook_event::mark_processed(db, row).await?;
    info!(provider = %row.provider, event_id = %row.event_id, event_type = %row.event_type, outcome = outcome.as_str(), "webhook event handled");
    Ok(outcome)
}

/// Major currency units (as providers send them) to cents.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Provider ids arrive as JSON numbers or strings.
pub(crate) fn id_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cents_conversion_rounds() {
        assert_eq!(to_cents(9.99), 999);
        assert_eq!(to_cents(19.5), 1950);
        assert_eq!(to_cents(0.1 + 0.2), 30);
        assert_eq!(to_cents(0.0), 0);
    }

    #[test]
    fn ids_from_numbers_and_strings() {
        assert_eq!(id_string(&json!(42)), Some("42".into()));
        assert_eq!(id_string(&json!(" abc ")), Some("abc".into()));
        assert_eq!(id_string(&json!("")), None);
        assert_eq!(id_string(&json!(null)), None);
    }

    #[test]
    fn missing_secret_is_not_configured() {
        let s = WebhookSettings::default();
        assert!(matches!(s.secret(), Err(WebhookError::NotConfigured)));
        let s = WebhookSettings { secret: Some("x".into()), license_validity_days: None };
        assert_eq!(s.secret().unwrap(), "x");
    }
}
