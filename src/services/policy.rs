//! 部署策略
//!
//! Decides which push events are deployed. An event is eligible when its image
//! key is configured for the active environment and, for registry payloads,
//! its tag has the form `<environment>-<build number>`.

use tracing::info;

use crate::config::DeploymentTargets;
use crate::domain::{PayloadFormat, PushEvent};

/// 可部署的推送事件
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EligibleDeployment {
    pub event: PushEvent,
    pub service: String,
}

impl EligibleDeployment {
    pub fn image(&self) -> String {
        self.event.image()
    }
}

/// 部署策略
#[derive(Clone, Debug)]
pub struct DeploymentPolicy {
    format: PayloadFormat,
    environment: String,
}

impl DeploymentPolicy {
    pub fn new(format: PayloadFormat, environment: impl Into<String>) -> Self {
        Self {
            format,
            environment: environment.into(),
        }
    }

    /// Registry payloads are keyed by repository, Docker Hub payloads by the full image
    pub fn image_key(&self, event: &PushEvent) -> String {
        match self.format {
            PayloadFormat::Registry => event.repository.clone(),
            PayloadFormat::DockerHub => event.image(),
        }
    }

    /// Whether `tag` is acceptable for this environment
    pub fn tag_is_recognized(&self, tag: &str) -> bool {
        match self.format {
            PayloadFormat::Registry => tag_matches_environment(tag, &self.environment),
            PayloadFormat::DockerHub => true,
        }
    }

    /// Resolve one event, logging when it is ignored
    pub fn resolve(
        &self,
        event: PushEvent,
        targets: &DeploymentTargets,
    ) -> Option<EligibleDeployment> {
        let target = targets.get(&self.image_key(&event));

        match target {
            Some(target) if self.tag_is_recognized(&event.tag) => Some(EligibleDeployment {
                service: target.service.clone(),
                event,
            }),
            _ => {
                info!(
                    image = %event,
                    "Received update for \"{}\" but not configured to handle updates for this image.",
                    event
                );
                None
            }
        }
    }

    pub fn select(
        &self,
        events: Vec<PushEvent>,
        targets: &DeploymentTargets,
    ) -> Vec<EligibleDeployment> {
        events
            .into_iter()
            .filter_map(|event| self.resolve(event, targets))
            .collect()
    }
}

/// `^{environment}-[0-9]+$` with the environment taken literally
pub fn tag_matches_environment(tag: &str, environment: &str) -> bool {
    tag.strip_prefix(environment)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|build| !build.is_empty() && build.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeploymentTarget;
    use std::collections::HashMap;

    fn targets(pairs: &[(&str, &str)]) -> DeploymentTargets {
        DeploymentTargets::new(
            pairs
                .iter()
                .map(|(image, service)| {
                    (
                        image.to_string(),
                        DeploymentTarget {
                            service: service.to_string(),
                        },
                    )
                })
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_tag_pattern_boundaries() {
        assert!(tag_matches_environment("production-42", "production"));
        assert!(tag_matches_environment("production-0", "production"));
        assert!(!tag_matches_environment("staging-42", "production"));
        assert!(!tag_matches_environment("production-abc", "production"));
        assert!(!tag_matches_environment("production-", "production"));
        assert!(!tag_matches_environment("production-42a", "production"));
        assert!(!tag_matches_environment("production42", "production"));
        assert!(!tag_matches_environment("xproduction-42", "production"));
    }

    #[test]
    fn test_environment_is_literal() {
        // a regex-special environment name must not act as a pattern
        assert!(tag_matches_environment("v1.2-7", "v1.2"));
        assert!(!tag_matches_environment("v1x2-7", "v1.2"));
        assert!(tag_matches_environment("a+b-1", "a+b"));
        assert!(!tag_matches_environment("aab-1", "a+b"));
    }

    #[test]
    fn test_registry_policy() {
        let policy = DeploymentPolicy::new(PayloadFormat::Registry, "production");
        let targets = targets(&[("registry.example.com/myapp", "myapp-svc")]);

        let eligible = policy.resolve(
            PushEvent::new("registry.example.com/myapp", "production-42"),
            &targets,
        );
        assert_eq!(
            eligible,
            Some(EligibleDeployment {
                event: PushEvent::new("registry.example.com/myapp", "production-42"),
                service: "myapp-svc".to_string(),
            })
        );

        // wrong tag
        assert!(policy
            .resolve(PushEvent::new("registry.example.com/myapp", "staging-42"), &targets)
            .is_none());
        // unconfigured repository
        assert!(policy
            .resolve(PushEvent::new("registry.example.com/other", "production-42"), &targets)
            .is_none());
    }

    #[test]
    fn test_docker_hub_policy_keys_on_full_image() {
        let policy = DeploymentPolicy::new(PayloadFormat::DockerHub, "production");
        let targets = targets(&[("myorg/myapp:latest", "myapp-svc")]);

        let event = PushEvent::new("myorg/myapp", "latest");
        assert_eq!(policy.image_key(&event), "myorg/myapp:latest");
        assert!(policy.tag_is_recognized("latest"));
        assert!(policy.resolve(event, &targets).is_some());

        assert!(policy
            .resolve(PushEvent::new("myorg/myapp", "edge"), &targets)
            .is_none());
    }

    #[test]
    fn test_select_keeps_only_eligible_events() {
        let policy = DeploymentPolicy::new(PayloadFormat::Registry, "production");
        let targets = targets(&[("r/a", "a-svc"), ("r/b", "b-svc")]);

        let selected = policy.select(
            vec![
                PushEvent::new("r/a", "production-1"),
                PushEvent::new("r/b", "staging-1"),
                PushEvent::new("r/c", "production-1"),
                PushEvent::new("r/b", "production-2"),
            ],
            &targets,
        );

        let services: Vec<_> = selected.iter().map(|d| d.service.as_str()).collect();
        assert_eq!(services, vec!["a-svc", "b-svc"]);
        assert_eq!(selected[1].image(), "r/b:production-2");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_ignored_image_logs_one_line() {
        let policy = DeploymentPolicy::new(PayloadFormat::Registry, "production");
        let targets = targets(&[("r/a", "a-svc")]);

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();

        let selected = tracing::subscriber::with_default(subscriber, || {
            policy.select(
                vec![
                    PushEvent::new("r/a", "production-1"),
                    PushEvent::new("r/c", "production-1"),
                ],
                &targets,
            )
        });
        assert_eq!(selected.len(), 1);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output
            .lines()
            .filter(|l| l.contains("but not configured to handle updates for this image."))
            .collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains(r#"Received update for "r/c:production-1""#));
    }
}
