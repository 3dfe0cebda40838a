pub mod auth;
pub mod categories;
pub mod contact;
pub mod licenses;
pub mod newsletter;
pub mod orders;
pub mod posts;
pub mod reviews;
pub mod templates;
pub mod users;
pub mod webhooks;

use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Deserializer};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use common::{pagination::Pagination, types::Health};

use crate::openapi::ApiDoc;
use auth::ServerState;

/// `?page=&limit=`; missing values fall back to page 1 and 20 items.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Items per page, clamped to 1..=100.
    pub limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let d = Pagination::default();
        Pagination::new(q.page.unwrap_or(d.page), q.limit.unwrap_or(d.limit))
    }
}

/// For optional foreign keys on update bodies: an absent key leaves the
/// value alone, while `null` or a blank string clears it.
/// Use with `#[serde(default, deserialize_with = "clearable_id")]`.
pub(crate) fn clearable_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Option<Uuid>>, D::Error> {
    match Option::<String>::deserialize(de)? {
        None => Ok(Some(None)),
        Some(raw) if raw.trim().is_empty() => Ok(Some(None)),
        Some(raw) => raw.trim().parse().map(|id| Some(Some(id))).map_err(serde::de::Error::custom),
    }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn api_routes() -> Router<ServerState> {
    Router::new()
        // auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me).put(auth::update_me))
        // users
        .route("/api/users", get(users::list))
        .route("/api/users/:id", get(users::get).put(users::update).delete(users::delete))
        // catalogue
        .route("/api/categories", get(categories::list).post(categories::create))
        .route(
            "/api/categories/:id",
            get(categories::get_by_slug).put(categories::update).delete(categories::delete),
        )
        .route("/api/posts", get(posts::list).post(posts::create))
        .route("/api/posts/:id", get(posts::get_by_slug).put(posts::update).delete(posts::delete))
        .route("/api/templates", get(templates::list).post(templates::create))
        .route(
            "/api/templates/:id",
            get(templates::get_by_slug).put(templates::update).delete(templates::delete),
        )
        .route("/api/templates/:id/reviews", get(reviews::list).post(reviews::create))
        .route("/api/reviews/:id", put(reviews::update).delete(reviews::delete))
        // contact & newsletter
        .route("/api/contact", post(contact::submit).get(contact::list))
        .route("/api/contact/:id", axum::routing::delete(contact::delete))
        .route("/api/contact/:id/handled", put(contact::mark_handled))
        .route("/api/newsletter/subscribe", post(newsletter::subscribe))
        .route("/api/newsletter/unsubscribe", post(newsletter::unsubscribe))
        .route("/api/newsletter/subscribers", get(newsletter::list))
        // commerce
        .route("/api/orders", get(orders::list_own))
        .route("/api/orders/:id", get(orders::get))
        .route("/api/admin/orders", get(orders::list_all))
        .route("/api/admin/orders/:id/status", put(orders::update_status))
        .route("/api/licenses", get(licenses::list_own))
        .route("/api/licenses/verify/:key", get(licenses::verify))
        .route("/api/admin/licenses/:id/revoke", put(licenses::revoke))
        .route("/api/webhooks/lemonsqueezy", post(webhooks::lemonsqueezy_webhook))
        .route("/api/webhooks/fastspring", post(webhooks::fastspring_webhook))
}

/// Build the full application router: health, API routes, Swagger UI.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth::attach_claims))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
