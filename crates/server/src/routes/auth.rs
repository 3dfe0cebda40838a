use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use configs::AppConfig;
use models::user;
use service::auth::{
    domain::{AuthUser, LoginInput, RegisterInput},
    repo::seaorm::SeaOrmAuthRepository,
    service::{AuthConfig, AuthService},
};
use service::user_service::{self, ProfileUpdate};
use service::webhooks::WebhookSettings;

use crate::errors::JsonApiError;
use crate::extract::CurrentUser;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub payments: configs::PaymentsConfig,
    pub licenses: configs::LicenseConfig,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        Self {
            db,
            auth: ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone(), token_ttl_hours: cfg.auth.token_ttl_hours },
            payments: cfg.payments.clone(),
            licenses: cfg.licenses.clone(),
        }
    }

    pub fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository::new(self.db.clone()));
        let mut cfg = AuthConfig::new(self.auth.jwt_secret.clone());
        cfg.token_ttl_hours = self.auth.token_ttl_hours;
        AuthService::new(repo, cfg)
    }

    pub fn lemonsqueezy_settings(&self) -> WebhookSettings {
        WebhookSettings {
            secret: self.payments.lemonsqueezy_webhook_secret.clone(),
            license_validity_days: self.licenses.validity_days,
        }
    }

    pub fn fastspring_settings(&self) -> WebhookSettings {
        WebhookSettings {
            secret: self.payments.fastspring_webhook_secret.clone(),
            license_validity_days: self.licenses.validity_days,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct UserOutput {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<AuthUser> for UserOutput {
    fn from(u: AuthUser) -> Self { Self { id: u.id, email: u.email, name: u.name, role: u.role } }
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: UserOutput,
    pub token: String,
    pub expires_at: i64,
}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = RegisterRequest,
    responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserOutput>), JsonApiError> {
    let created = state
        .auth_service()
        .register(RegisterInput { email: input.email, name: input.name, password: input.password })
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

fn auth_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = LoginRequest,
    responses((status = 200, description = "Logged in, auth_token cookie set"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state
        .auth_service()
        .login(LoginInput { email: input.email, password: input.password })
        .await?;
    let jar = jar.add(auth_cookie(session.token.clone()));
    let out = LoginOutput { user: session.user.into(), token: session.token, expires_at: session.expires_at };
    Ok((jar, Json(out)))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    // removal cookie is sent even when the request carried none
    let mut cookie = auth_cookie(String::new());
    cookie.make_removal();
    (jar.add(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth",
    responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, current: CurrentUser) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(user_service::get_active_user(&state.db, current.id).await?))
}

#[utoipa::path(put, path = "/api/auth/me", tag = "auth", request_body = UpdateMeRequest,
    responses((status = 200, description = "Updated"), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized")))]
pub async fn update_me(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(input): Json<UpdateMeRequest>,
) -> Result<Json<user::Model>, JsonApiError> {
    let update = ProfileUpdate { name: input.name, password: input.password };
    Ok(Json(user_service::update_profile(&state.db, current.id, update).await?))
}

/// Bearer header first, then the `auth_token` cookie.
fn token_from_request(req: &Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }
    CookieJar::from_headers(req.headers())
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Global middleware: decode the caller's token, if any, and stash the claims
/// in request extensions. Rejection is left to the `CurrentUser`/`AdminUser`
/// extractors so public routes still work with a stale cookie.
pub async fn attach_claims(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = token_from_request(&req) {
        match service::auth::decode_token(&state.auth.jwt_secret, &token) {
            Ok(claims) => {
                debug!(sub = %claims.sub, "authenticated request");
                req.extensions_mut().insert(claims);
            }
            Err(e) => warn!(path = %req.uri().path(), error = %e, "ignoring invalid token"),
        }
    }
    next.run(req).await
}
