use utoipa::OpenApi;
use utoipa::ToSchema;

use crate::routes::{auth, categories, contact, newsletter, orders, posts, reviews, templates, users};

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::update_me,
        crate::routes::users::list,
        crate::routes::users::get,
        crate::routes::users::update,
        crate::routes::users::delete,
        crate::routes::categories::list,
        crate::routes::categories::get_by_slug,
        crate::routes::categories::create,
        crate::routes::categories::update,
        crate::routes::categories::delete,
        crate::routes::posts::list,
        crate::routes::posts::get_by_slug,
        crate::routes::posts::create,
        crate::routes::posts::update,
        crate::routes::posts::delete,
        crate::routes::templates::list,
        crate::routes::templates::get_by_slug,
        crate::routes::templates::create,
        crate::routes::templates::update,
        crate::routes::templates::delete,
        crate::routes::reviews::list,
        crate::routes::reviews::create,
        crate::routes::reviews::update,
        crate::routes::reviews::delete,
        crate::routes::contact::submit,
        crate::routes::contact::list,
        crate::routes::contact::mark_handled,
        crate::routes::contact::delete,
        crate::routes::newsletter::subscribe,
        crate::routes::newsletter::unsubscribe,
        crate::routes::newsletter::list,
        crate::routes::orders::list_own,
        crate::routes::orders::get,
        crate::routes::orders::list_all,
        crate::routes::orders::update_status,
        crate::routes::licenses::list_own,
        crate::routes::licenses::verify,
        crate::routes::licenses::revoke,
        crate::routes::webhooks::lemonsqueezy_webhook,
        crate::routes::webhooks::fastspring_webhook,
    ),
    components(
        schemas(
            HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UpdateMeRequest,
            users::UpdateUserRequest,
            categories::CreateCategoryRequest,
            categories::UpdateCategoryRequest,
            posts::CreatePostRequest,
            posts::UpdatePostRequest,
            templates::CreateTemplateRequest,
            templates::UpdateTemplateRequest,
            reviews::CreateReviewRequest,
            reviews::UpdateReviewRequest,
            contact::ContactRequest,
            newsletter::EmailRequest,
            orders::OrderStatusRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "categories"),
        (name = "posts"),
        (name = "templates"),
        (name = "reviews"),
        (name = "contact"),
        (name = "newsletter"),
        (name = "orders"),
        (name = "licenses"),
        (name = "webhooks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for p in [
            "/health",
            "/api/auth/login",
            "/api/templates/{id}/reviews",
            "/api/licenses/verify/{key}",
            "/api/webhooks/fastspring",
        ] {
            assert!(paths.contains_key(p), "missing {p}");
        }
    }
}
