//! Webhook 投递处理
//!
//! Runs after the caller already received its `200 OK`: decode the body,
//! normalize it to push events, filter them and deploy what is eligible.

use axum::body::Bytes;
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::domain::{decode_body, DeployReport};
use crate::state::AppState;

/// 已接收的 webhook 请求
#[derive(Clone, Debug)]
pub struct Delivery {
    pub id: Uuid,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Delivery {
    pub fn new(content_type: Option<String>, body: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type,
            body,
        }
    }
}

/// Process a delivery to completion. Never fails; problems are logged.
pub async fn process(state: Arc<AppState>, delivery: Delivery) -> Vec<DeployReport> {
    let span = tracing::info_span!("delivery", delivery_id = %delivery.id);
    process_inner(state, delivery).instrument(span).await
}

async fn process_inner(state: Arc<AppState>, delivery: Delivery) -> Vec<DeployReport> {
    let payload = match decode_body(delivery.content_type.as_deref(), &delivery.body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Ignoring webhook with undecodable body");
            return Vec::new();
        }
    };

    let events = state.settings.env.payload_format.normalize(&payload);
    if events.is_empty() {
        info!("Webhook contained no push events");
        return Vec::new();
    }

    let eligible = state.policy.select(events, &state.settings.targets);
    if eligible.is_empty() {
        return Vec::new();
    }

    state.deployer.deploy_all(&eligible).await
}
