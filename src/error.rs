//! 统一错误处理
//!
//! `ApiError` implements `IntoResponse` so handlers and extractors can bail out
//! with `?` and the caller receives a plain-text body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// 返回给 webhook 调用方的错误
///
/// Only the authentication layer and routing can fail from the caller's point
/// of view; everything after authentication is reported through logs and the
/// notification channel instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401 - no `Authorization` header
    #[error("Authorization header missing")]
    MissingAuthorization,
    /// 401 - header present but not `Bearer <token>`
    #[error("Invalid authentication scheme")]
    InvalidScheme,
    /// 401 - empty or wrong token
    #[error("Invalid token")]
    InvalidToken,
    /// 404 - any other path or method
    #[error("Not found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAuthorization | ApiError::InvalidScheme | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
