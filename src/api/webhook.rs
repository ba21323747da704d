//! Webhook 接口
//!
//! `POST /` is the only route. The caller gets `OK` as soon as it is
//! authenticated; deployment runs in the background and reports through logs
//! and notifications.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::RequireBearerToken;
use crate::services::{self, Delivery};
use crate::state::AppState;

/// Webhook 路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(receive_webhook).fallback(not_found))
}

/// 接收镜像推送通知
///
/// POST /
/// Requires `Authorization: Bearer <token>`
async fn receive_webhook(
    _auth: RequireBearerToken,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> &'static str {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let delivery = Delivery::new(content_type, body);
    tracing::info!(
        delivery_id = %delivery.id,
        content_type = ?delivery.content_type,
        bytes = delivery.body.len(),
        "Accepted webhook"
    );

    state
        .tasks
        .spawn(services::delivery::process(state.clone(), delivery));

    "OK"
}

/// 其他路径或方法
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
