//! Request extractors for authenticated callers.
//!
//! Both read the `Claims` that `routes::auth::attach_claims` put into the
//! request extensions.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use service::auth::Claims;

use crate::errors::JsonApiError;

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool { self.claims.is_admin() }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| JsonApiError::unauthorized("authentication required"))?;
        let id = claims.user_id().ok_or_else(|| JsonApiError::unauthorized("malformed token subject"))?;
        Ok(CurrentUser { id, email: claims.email.clone(), role: claims.role.clone(), claims })
    }
}

/// A `CurrentUser` whose token carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(JsonApiError::forbidden("admin role required"));
        }
        Ok(AdminUser(user))
    }
}
