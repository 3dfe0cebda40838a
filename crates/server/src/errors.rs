use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;
use service::webhooks::WebhookError;

/// Error body shared by every endpoint: `{"error": "...", "message": "..."}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: String,
    pub message: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &str, message: Option<String>) -> Self {
        Self { status, error: error.to_string(), message }
    }

    pub fn unauthorized(message: &str) -> Self { Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(message.into())) }

    pub fn forbidden(message: &str) -> Self { Self::new(StatusCode::FORBIDDEN, "Forbidden", Some(message.into())) }

    fn internal(detail: String) -> Self {
        error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: &self.error, message: self.message.as_deref() };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
            ServiceError::Unauthorized(msg) => JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg)),
            ServiceError::Forbidden(msg) => JsonApiError::new(StatusCode::FORBIDDEN, "Forbidden", Some(msg)),
            ServiceError::NotFound(msg) => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            ServiceError::Conflict(msg) => JsonApiError::new(StatusCode::CONFLICT, "Conflict", Some(msg)),
            ServiceError::Db(msg) => JsonApiError::internal(msg),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let code = e.code();
        match e {
            AuthError::Validation(msg) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
            AuthError::Conflict => JsonApiError::new(StatusCode::CONFLICT, "Conflict", Some("email already registered".into())),
            AuthError::NotFound => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some("user not found".into())),
            AuthError::Unauthorized => JsonApiError::unauthorized("invalid credentials"),
            other => JsonApiError::internal(format!("auth error {code}: {other}")),
        }
    }
}

impl From<WebhookError> for JsonApiError {
    fn from(e: WebhookError) -> Self {
        match e {
            WebhookError::NotConfigured => JsonApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Webhook Disabled", Some("webhook secret not configured".into())),
            WebhookError::MissingSignature => JsonApiError::unauthorized("missing signature"),
            WebhookError::InvalidSignature => JsonApiError::unauthorized("invalid signature"),
            WebhookError::Payload(msg) => JsonApiError::new(StatusCode::BAD_REQUEST, "Invalid Payload", Some(msg)),
            WebhookError::Service(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Db("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn db_details_are_not_leaked() {
        let e = JsonApiError::from(ServiceError::Db("connection refused at 10.0.0.3".into()));
        assert!(e.message.is_none());
    }

    #[test]
    fn webhook_errors_map_to_status_codes() {
        assert_eq!(JsonApiError::from(WebhookError::NotConfigured).status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(JsonApiError::from(WebhookError::MissingSignature).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(WebhookError::InvalidSignature).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(WebhookError::Payload("bad".into())).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            JsonApiError::from(WebhookError::Service(ServiceError::Conflict("dup".into()))).status,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn auth_errors_map_to_status_codes() {
        assert_eq!(JsonApiError::from(AuthError::Conflict).status, StatusCode::CONFLICT);
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::TokenError("x".into())).status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
