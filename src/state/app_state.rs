//! 应用状态

use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

use crate::config::Settings;
use crate::infra::{CommandRunner, Notifier, ProcessRunner, SlackNotifier};
use crate::services::{Deployer, DeploymentPolicy};

/// 全局共享状态
pub struct AppState {
    /// Configuration loaded at startup
    pub settings: Settings,
    /// Eligibility rules for the active environment
    pub policy: DeploymentPolicy,
    /// Login + update orchestrator
    pub deployer: Deployer,
    /// 后台任务（部署、通知），关闭时等待其完成
    pub tasks: TaskTracker,
}

impl AppState {
    /// Build state with explicit collaborators
    pub fn new(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_tasks(settings, runner, notifier, TaskTracker::new())
    }

    fn with_tasks(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
        tasks: TaskTracker,
    ) -> Self {
        let policy = DeploymentPolicy::new(
            settings.env.payload_format,
            settings.env.environment.clone(),
        );
        let deployer = Deployer::new(
            settings.env.docker_path.clone(),
            settings.credentials.registry.clone(),
            runner,
            notifier,
        );

        Self {
            settings,
            policy,
            deployer,
            tasks,
        }
    }

    /// Build state backed by the docker CLI and the Slack webhook
    pub fn from_settings(settings: Settings) -> Result<Self, reqwest::Error> {
        let tasks = TaskTracker::new();
        let runner = Arc::new(ProcessRunner::new(settings.env.command_timeout));
        let notifier = Arc::new(SlackNotifier::new(
            settings.env.notify_url.clone(),
            tasks.clone(),
        )?);

        tracing::info!(
            docker = %settings.env.docker_path,
            command_timeout = ?settings.env.command_timeout,
            notifications = notifier.is_enabled(),
            "Initialized deployment collaborators"
        );

        Ok(Self::with_tasks(settings, runner, notifier, tasks))
    }

    /// Shared secret expected in the `Authorization` header
    pub fn token(&self) -> &str {
        &self.settings.credentials.token
    }

    /// 停止接收新任务并等待已有任务结束
    ///
    /// Returns `false` when `limit` elapsed with tasks still running.
    pub async fn drain(&self, limit: Duration) -> bool {
        self.tasks.close();
        if self.tasks.is_empty() {
            return true;
        }

        tracing::info!(running = self.tasks.len(), "Waiting for background deployments");
        match tokio::time::timeout(limit, self.tasks.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::error!(
                    running = self.tasks.len(),
                    timeout_secs = limit.as_secs(),
                    "Background deployments still running at shutdown, abandoning them"
                );
                false
            }
        }
    }
}
