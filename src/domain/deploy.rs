//! 部署领域模型

use chrono::{DateTime, Utc};

/// 阶段状态
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

/// 部署阶段
#[derive(Clone, Debug)]
pub struct DeployStage {
    /// Stage identifier (`registry_login`, `service_update`)
    pub name: &'static str,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Duration in milliseconds
    pub duration_ms: Option<i64>,
    pub status: StageStatus,
    pub message: Option<String>,
}

impl DeployStage {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            status: StageStatus::Pending,
            message: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
        self.status = StageStatus::Running;
    }

    pub fn finish(&mut self, success: bool, message: Option<String>) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.status = if success {
            StageStatus::Success
        } else {
            StageStatus::Failed
        };
        self.message = message;
        if let Some(started) = self.started_at {
            self.duration_ms = Some((now - started).num_milliseconds());
        }
    }

    pub fn skip(&mut self, reason: Option<String>) {
        self.status = StageStatus::Skipped;
        self.message = reason;
    }
}

/// 部署结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Deployed {
        image: String,
        service: String,
    },
    LoginFailed {
        image: String,
        service: String,
        registry: String,
    },
    UpdateFailed {
        image: String,
        service: String,
    },
}

impl DeploymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentOutcome::Deployed { .. })
    }

    /// Operator-facing message, sent as-is to the notification channel
    pub fn message(&self) -> String {
        match self {
            DeploymentOutcome::Deployed { image, service } => format!(
                "Deployed {} to {} successfully and restarted the service.",
                image, service
            ),
            DeploymentOutcome::LoginFailed {
                image,
                service,
                registry,
            } => format!(
                "Failed to log in to {} before deploying {} to {}!",
                registry, image, service
            ),
            DeploymentOutcome::UpdateFailed { image, service } => {
                format!("Failed to deploy {} to {}!", image, service)
            }
        }
    }
}

/// 部署报告（结果 + 各阶段耗时）
#[derive(Clone, Debug)]
pub struct DeployReport {
    pub outcome: DeploymentOutcome,
    pub stages: Vec<DeployStage>,
}

impl DeployReport {
    pub fn stage(&self, name: &str) -> Option<&DeployStage> {
        self.stages.iter().find(|s| s.name == name)
    }
}
