//! Webhook 负载规范化
//!
//! Two payload shapes are supported, one per deployment:
//! - `Registry`: Docker registry notification envelope with an `events` list
//!   (<https://distribution.github.io/distribution/about/notifications/>)
//! - `DockerHub`: Docker Hub's single push webhook
//!
//! Both normalize to a list of [`PushEvent`]. Payloads that don't fit the
//! configured shape produce no events; they never fail the request.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::push::PushEvent;

/// Webhook 负载格式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Multi-event registry notifications
    Registry,
    /// Single-event Docker Hub webhooks
    DockerHub,
}

impl PayloadFormat {
    /// Parse the `WEBHOOK_FORMAT` setting
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "registry" | "distribution" => Some(PayloadFormat::Registry),
            "docker-hub" | "docker_hub" | "dockerhub" | "hub" => Some(PayloadFormat::DockerHub),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PayloadFormat::Registry => "registry",
            PayloadFormat::DockerHub => "docker-hub",
        }
    }

    /// Extract every push event this payload describes
    pub fn normalize(&self, payload: &Value) -> Vec<PushEvent> {
        match self {
            PayloadFormat::Registry => registry_events(payload),
            PayloadFormat::DockerHub => docker_hub_event(payload).into_iter().collect(),
        }
    }
}

/// Strings as-is, numbers and booleans in their JSON spelling
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn registry_events(payload: &Value) -> Vec<PushEvent> {
    let Some(events) = payload.get("events").and_then(Value::as_array) else {
        warn!("Registry payload has no events list");
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| {
            if !event.is_object() {
                warn!(event = %event, "Skipping registry event that is not an object");
                return None;
            }
            if event.get("action").and_then(Value::as_str) != Some("push") {
                return None;
            }

            let repository =
                scalar_text(event.pointer("/target/repository")).filter(|r| !r.is_empty())?;
            let tag = scalar_text(event.pointer("/target/tag")).filter(|t| !t.is_empty())?;
            let host = scalar_text(event.pointer("/request/host")).unwrap_or_default();

            Some(PushEvent::new(format!("{}/{}", host, repository), tag))
        })
        .collect()
}

#[derive(Deserialize)]
struct HubPayload {
    repository: HubRepository,
    push_data: HubPushData,
}

#[derive(Deserialize)]
struct HubRepository {
    repo_name: String,
}

#[derive(Deserialize)]
struct HubPushData {
    tag: String,
}

fn docker_hub_event(payload: &Value) -> Option<PushEvent> {
    match HubPayload::deserialize(payload) {
        Ok(hub) => Some(PushEvent::new(hub.repository.repo_name, hub.push_data.tag)),
        Err(e) => {
            warn!(error = %e, "Docker Hub payload is missing repository.repo_name or push_data.tag");
            None
        }
    }
}
