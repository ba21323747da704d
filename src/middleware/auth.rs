//! Bearer Token 认证
//!
//! Provides the `RequireBearerToken` extractor guarding the webhook endpoint.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Bearer Token 认证提取器
///
/// Rejects with a 401 whose body names the failure: missing header, wrong
/// scheme or wrong token.
///
/// # Example
///
/// ```ignore
/// async fn protected_handler(
///     _auth: RequireBearerToken,
///     State(state): State<Arc<AppState>>,
/// ) -> impl IntoResponse {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireBearerToken;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireBearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        verify_bearer_token(&parts.headers, state.token())
    }
}

/// Check `Authorization: Bearer <token>` against the configured token.
///
/// Plain string equality, not constant time.
pub fn verify_bearer_token(
    headers: &HeaderMap,
    expected_token: &str,
) -> Result<RequireBearerToken, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        tracing::warn!("Webhook called without Authorization header");
        return Err(ApiError::MissingAuthorization);
    };

    let Some(token) = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
    else {
        tracing::warn!("Webhook called with invalid authentication scheme (must be Bearer)");
        return Err(ApiError::InvalidScheme);
    };

    if token.is_empty() || token != expected_token {
        tracing::warn!("Webhook called with invalid token");
        return Err(ApiError::InvalidToken);
    }

    Ok(RequireBearerToken)
}
