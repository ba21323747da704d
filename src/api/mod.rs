//! API 模块
//!
//! HTTP 处理器与路由组装

pub mod webhook;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 构建完整路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(webhook::router())
        .fallback(webhook::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
