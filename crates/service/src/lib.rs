//! Service layer: business operations on top of the `models` entities.
//! - Handlers call these functions and map `ServiceError` to HTTP.
//! - Validation is reused from `models`; authorization decisions that depend
//!   on data (ownership) are made here.

pub mod errors;
pub mod pagination;
pub mod slugs;
pub mod auth;
pub mod user_service;
pub mod category_service;
pub mod post_service;
pub mod template_service;
pub mod review_service;
pub mod contact_service;
pub mod newsletter_service;
pub mod order_service;
pub mod license_service;
pub mod webhooks;
#[cfg(test)]
pub mod test_support;
