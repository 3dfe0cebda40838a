//! In-process router tests. Every request here is rejected (or answered)
//! before a query runs, so the state carries a disconnected database.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::prelude::*;
use hmac::{Hmac, Mac};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use configs::AppConfig;
use server::routes::{self, auth::ServerState};
use service::auth::{domain::AuthUser, service::issue_token};

const SECRET: &str = "test-secret";
const LS_SECRET: &str = "ls-test-secret";
const FS_SECRET: &str = "fs-test-secret";

fn config(with_webhooks: bool) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = SECRET.into();
    if with_webhooks {
        cfg.payments.lemonsqueezy_webhook_secret = Some(LS_SECRET.into());
        cfg.payments.fastspring_webhook_secret = Some(FS_SECRET.into());
    }
    cfg
}

fn app(with_webhooks: bool) -> Router {
    let state = ServerState::new(DatabaseConnection::Disconnected, &config(with_webhooks));
    routes::build_router(state, tower_http::cors::CorsLayer::very_permissive())
}

fn token(role: &str) -> String {
    let user = AuthUser {
        id: Uuid::new_v4(),
        email: "someone@example.com".into(),
        name: "Someone".into(),
        role: role.into(),
        active: true,
    };
    issue_token(SECRET, &user, 1).unwrap().0
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(t) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let resp = app(false).oneshot(get("/health", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let resp = app(false).oneshot(get("/api-docs/openapi.json", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_json(resp).await;
    assert!(doc["paths"]["/api/auth/login"].is_object());
}

#[tokio::test]
async fn me_requires_a_token() {
    let resp = app(false).oneshot(get("/api/auth/me", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "Unauthorized");
}

#[tokio::test]
async fn invalid_token_is_treated_as_anonymous() {
    let resp = app(false).oneshot(get("/api/orders", Some("not-a-jwt"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let user = AuthUser { id: Uuid::new_v4(), email: "x@example.com".into(), name: "X".into(), role: "admin".into(), active: true };
    let (forged, _) = issue_token("other-secret", &user, 1).unwrap();
    let resp = app(false).oneshot(get("/api/users", Some(&forged))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let user_token = token("user");
    for uri in ["/api/users", "/api/contact", "/api/newsletter/subscribers", "/api/admin/orders"] {
        let resp = app(false).oneshot(get(uri, Some(&user_token))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn admin_writes_reject_regular_users() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/categories")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("user")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "Themes" }).to_string()))
        .unwrap();
    let resp = app(false).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    // reaches the admin check, so the cookie was decoded
    let req = Request::builder()
        .method("GET")
        .uri("/api/users")
        .header(header::COOKIE, format!("auth_token={}", token("user")))
        .body(Body::empty())
        .unwrap();
    let resp = app(false).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let resp = app(false).oneshot(post_json("/api/auth/logout", json!({}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let set_cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("auth_token="));
}

#[tokio::test]
async fn register_validates_before_touching_the_database() {
    let body = json!({ "email": "not-an-email", "name": "N", "password": "longenough" });
    let resp = app(false).oneshot(post_json("/api/auth/register", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contact_validates_before_touching_the_database() {
    let body = json!({ "name": "", "email": "a@example.com", "subject": "Hi", "message": "Hello" });
    let resp = app(false).oneshot(post_json("/api/contact", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_license_key_is_a_bad_request() {
    let resp = app(false).oneshot(get("/api/licenses/verify/nope", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhooks_are_disabled_without_a_secret() {
    for uri in ["/api/webhooks/lemonsqueezy", "/api/webhooks/fastspring"] {
        let resp = app(false).oneshot(post_json(uri, json!({}))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
    }
}

#[tokio::test]
async fn webhook_without_signature_is_unauthorized() {
    let resp = app(true).oneshot(post_json("/api/webhooks/lemonsqueezy", json!({}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_with_bad_signature_is_unauthorized() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/fastspring")
        .header("x-fs-signature", BASE64_STANDARD.encode(b"garbage"))
        .body(Body::from(r#"{"events":[]}"#))
        .unwrap();
    let resp = app(true).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_but_malformed_payload_is_a_bad_request() {
    let body = b"{not json";
    let mut mac = Hmac::<Sha256>::new_from_slice(LS_SECRET.as_bytes()).unwrap();
    mac.update(body);
    let signature = hex::encode(mac.finalize().into_bytes());
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/lemonsqueezy")
        .header("x-signature", signature)
        .body(Body::from(body.to_vec()))
        .unwrap();
    let resp = app(true).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_empty_fastspring_batch_processes_nothing() {
    let body = br#"{"events":[]}"#;
    let mut mac = Hmac::<Sha256>::new_from_slice(FS_SECRET.as_bytes()).unwrap();
    mac.update(body);
    let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/fastspring")
        .header("x-fs-signature", signature)
        .body(Body::from(body.to_vec()))
        .unwrap();
    let resp = app(true).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["processed"], json!([]));
}
