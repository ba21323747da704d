//! 部署编排
//!
//! Every eligible image goes through two stages:
//! 1. `docker login` against the configured registry
//! 2. `docker service update --force --with-registry-auth --image=<image>`
//!
//! The update only runs after a successful login. Each outcome, failure or
//! success, is logged and sent to the notification channel. Nothing is retried.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::RegistryAuth;
use crate::domain::{DeployReport, DeployStage, DeploymentOutcome};
use crate::infra::{CommandRunner, DockerCommand, Notifier};

use super::locks::ServiceLocks;
use super::policy::EligibleDeployment;

pub const STAGE_REGISTRY_LOGIN: &str = "registry_login";
pub const STAGE_SERVICE_UPDATE: &str = "service_update";

/// 部署执行器（login + update）
pub struct Deployer {
    docker: String,
    registry: RegistryAuth,
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn Notifier>,
    locks: ServiceLocks,
}

impl Deployer {
    pub fn new(
        docker: impl Into<String>,
        registry: RegistryAuth,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            docker: docker.into(),
            registry,
            runner,
            notifier,
            locks: ServiceLocks::new(),
        }
    }

    /// Deploy every image concurrently. Updates of the same service are serialized.
    pub async fn deploy_all(&self, deployments: &[EligibleDeployment]) -> Vec<DeployReport> {
        join_all(deployments.iter().map(|d| self.deploy(d))).await
    }

    /// Deploy one image to its service
    pub async fn deploy(&self, deployment: &EligibleDeployment) -> DeployReport {
        let image = deployment.image();
        let service = deployment.service.as_str();

        if self.locks.is_locked(service).await {
            info!(
                image = %image,
                service = %service,
                "Waiting for running deployment of {}",
                service
            );
        }
        let _guard = self.locks.acquire(service).await;
        info!(image = %image, service = %service, "Updating image \"{}\"", image);

        let mut stages = vec![
            DeployStage::new(STAGE_REGISTRY_LOGIN),
            DeployStage::new(STAGE_SERVICE_UPDATE),
        ];

        // Stage 1: registry login
        stages[0].start();
        let login = DockerCommand::login(
            &self.docker,
            &self.registry.username,
            &self.registry.password,
            self.registry.host.as_deref(),
        );

        if let Err(e) = self.runner.run(&login).await {
            error!(
                image = %image,
                service = %service,
                registry = self.registry.display_host(),
                error = %e,
                "Registry login failed"
            );
            stages[0].finish(false, Some(e.to_string()));
            stages[1].skip(Some("registry login failed".to_string()));

            let outcome = DeploymentOutcome::LoginFailed {
                image,
                service: service.to_string(),
                registry: self.registry.display_host().to_string(),
            };
            return self.report(outcome, stages);
        }
        stages[0].finish(true, None);

        // Stage 2: forced service update
        info!(image = %image, service = %service, "Deploying {} to {}...", image, service);
        stages[1].start();
        let update = DockerCommand::service_update(&self.docker, service, &image);

        let outcome = match self.runner.run(&update).await {
            Ok(()) => {
                stages[1].finish(true, None);
                DeploymentOutcome::Deployed {
                    image,
                    service: service.to_string(),
                }
            }
            Err(e) => {
                error!(image = %image, service = %service, error = %e, "Service update failed");
                stages[1].finish(false, Some(e.to_string()));
                DeploymentOutcome::UpdateFailed {
                    image,
                    service: service.to_string(),
                }
            }
        };

        self.report(outcome, stages)
    }

    fn report(&self, outcome: DeploymentOutcome, stages: Vec<DeployStage>) -> DeployReport {
        let report = DeployReport { outcome, stages };
        let message = report.outcome.message();
        let login_ms = report.stage(STAGE_REGISTRY_LOGIN).and_then(|s| s.duration_ms);
        let update_ms = report.stage(STAGE_SERVICE_UPDATE).and_then(|s| s.duration_ms);

        if report.outcome.is_success() {
            info!(login_ms = ?login_ms, update_ms = ?update_ms, "{}", message);
        } else {
            error!(login_ms = ?login_ms, update_ms = ?update_ms, "{}", message);
        }
        self.notifier.send(&message);

        report
    }
}
