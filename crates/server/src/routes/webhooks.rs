//! Payment provider callbacks. Both handlers hand the raw body to the
//! service layer, which verifies the signature before parsing anything.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use service::webhooks::{fastspring, lemonsqueezy, fastspring::BatchResult};

use super::auth::ServerState;
use crate::errors::JsonApiError;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[utoipa::path(post, path = "/api/webhooks/lemonsqueezy", tag = "webhooks",
    responses((status = 200, description = "Acknowledged"), (status = 400, description = "Malformed payload"),
              (status = 401, description = "Missing or invalid signature"), (status = 503, description = "Secret not configured")))]
pub async fn lemonsqueezy_webhook(State(state): State<ServerState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>, JsonApiError> {
    let settings = state.lemonsqueezy_settings();
    let signature = header(&headers, lemonsqueezy::SIGNATURE_HEADER);
    let outcome = lemonsqueezy::handle(&state.db, &settings, signature, &body).await?;
    info!(provider = lemonsqueezy::PROVIDER, outcome = outcome.as_str(), "webhook handled");
    Ok(Json(json!({ "status": outcome.as_str() })))
}

#[utoipa::path(post, path = "/api/webhooks/fastspring", tag = "webhooks",
    responses((status = 200, description = "Ids of events processed"), (status = 400, description = "Malformed payload"),
              (status = 401, description = "Missing or invalid signature"), (status = 503, description = "Secret not configured")))]
pub async fn fastspring_webhook(State(state): State<ServerState>, headers: HeaderMap, body: Bytes) -> Result<Json<BatchResult>, JsonApiError> {
    let settings = state.fastspring_settings();
    let signature = header(&headers, fastspring::SIGNATURE_HEADER);
    let result = fastspring::handle(&state.db, &settings, signature, &body).await?;
    info!(provider = fastspring::PROVIDER, processed = result.processed.len(), "webhook batch handled");
    Ok(Json(result))
}
