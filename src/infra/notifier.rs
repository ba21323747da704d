//! 运维通知
//!
//! 部署结果发送到 Slack 兼容的 incoming webhook。发送在后台任务中进行，
//! 失败只记录日志。

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// 发送文本消息
pub trait Notifier: Send + Sync {
    /// Queue a message for delivery. Never blocks and never fails.
    fn send(&self, text: &str);
}

/// 通知发送错误
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Webhook returned {0}")]
    NonSuccessStatus(StatusCode),
}

/// Slack incoming webhook 客户端
///
/// Without a webhook URL every `send` is a no-op. Posts run on `tasks` so
/// shutdown can wait for them.
#[derive(Clone, Debug)]
pub struct SlackNotifier {
    client: Client,
    webhook_url: Option<String>,
    tasks: TaskTracker,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>, tasks: TaskTracker) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.filter(|u| !u.is_empty()),
            tasks,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

}

impl Notifier for SlackNotifier {
    fn send(&self, text: &str) {
        let Some(url) = self.webhook_url.clone() else {
            debug!("Notifications disabled, dropping message");
            return;
        };

        let client = self.client.clone();
        let text = text.to_string();
        self.tasks.spawn(async move {
            if let Err(e) = post_message(&client, &url, &text).await {
                warn!(error = %e, "Failed to send notification");
            }
        });
    }
}

async fn post_message(client: &Client, url: &str, text: &str) -> Result<(), NotifyError> {
    let response = client
        .post(url)
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(NotifyError::NonSuccessStatus(response.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(url: Option<&str>) -> SlackNotifier {
        SlackNotifier::new(url.map(str::to_string), TaskTracker::new()).unwrap()
    }

    #[test]
    fn test_notifier_without_url() {
        let notifier = notifier(None);
        assert!(!notifier.is_enabled());

        // no runtime here: a disabled notifier must not try to spawn
        notifier.send("Deployed x to y successfully and restarted the service.");
        assert!(notifier.tasks.is_empty());
    }

    #[test]
    fn test_empty_url_disables_notifier() {
        assert!(!notifier(Some("")).is_enabled());
    }

    #[tokio::test]
    async fn test_send_runs_on_tracked_task() {
        // nothing listens on port 9, the post fails and is only logged
        let notifier = notifier(Some("http://127.0.0.1:9/hook"));
        assert!(notifier.is_enabled());

        notifier.send("Failed to deploy x to y!");
        assert_eq!(notifier.tasks.len(), 1);

        notifier.tasks.close();
        tokio::time::timeout(std::time::Duration::from_secs(15), notifier.tasks.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_to_unreachable_url_is_network_error() {
        let client = Client::new();
        let err = post_message(&client, "http://127.0.0.1:9/hook", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Network(_)));
    }
}
