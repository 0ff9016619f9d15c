//! Request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use domain::Principal;
use store::Store;

use crate::AppState;
use crate::error::ApiError;

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// Capability checks happen in the domain layer, so admin-only routes use
/// this extractor too.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthUser(principal): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", principal.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthUser
where
    S: Store + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthenticated("Authorization token required".to_string()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::Unauthenticated("Invalid authorization header".to_string()))?;

        let principal = state.identity.authenticate(token)?;
        Ok(Self(principal))
    }
}

/// Pulls the token out of a `Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
