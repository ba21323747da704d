//! 环境变量配置加载

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigError;
use crate::domain::webhook::PayloadFormat;

/// 环境配置（不含密钥）
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// Listening port
    pub port: u16,
    /// Environment selector, picks the config section and the accepted tag prefix
    pub environment: String,
    /// Which webhook payload shape this deployment receives
    pub payload_format: PayloadFormat,
    /// Path of the JSON deployment target file
    pub config_file: PathBuf,
    /// Docker CLI binary
    pub docker_path: String,
    /// Slack-compatible incoming webhook URL
    pub notify_url: Option<String>,
    /// Upper bound for each docker invocation; unbounded when unset
    pub command_timeout: Option<Duration>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_PORT,
            environment: constants::DEFAULT_ENVIRONMENT.to_string(),
            payload_format: PayloadFormat::Registry,
            config_file: PathBuf::from(constants::DEFAULT_CONFIG_FILE),
            docker_path: constants::DEFAULT_DOCKER_PATH.to_string(),
            notify_url: None,
            command_timeout: None,
        }
    }
}

impl EnvConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| var(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value: raw,
            })?,
            None => defaults.port,
        };

        let payload_format = match lookup("WEBHOOK_FORMAT") {
            Some(raw) => PayloadFormat::parse(&raw).ok_or(ConfigError::InvalidValue {
                var: "WEBHOOK_FORMAT",
                value: raw,
            })?,
            None => defaults.payload_format,
        };

        let command_timeout = match lookup("DEPLOY_COMMAND_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    var: "DEPLOY_COMMAND_TIMEOUT_SECS",
                    value: raw,
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            port,
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            payload_format,
            config_file: lookup("CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_file),
            docker_path: lookup("DOCKER").unwrap_or(defaults.docker_path),
            notify_url: lookup("SLACK_WEBHOOK_URL"),
            command_timeout,
        })
    }
}

/// 常量
pub mod constants {
    use std::time::Duration;

    pub const DEFAULT_PORT: u16 = 3000;

    pub const DEFAULT_ENVIRONMENT: &str = "production";

    pub const DEFAULT_CONFIG_FILE: &str = "config.json";

    pub const DEFAULT_DOCKER_PATH: &str = "/usr/bin/docker";

    /// 关闭时等待后台部署完成的上限
    pub const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

    /// Version
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EnvConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.environment, "production");
        assert_eq!(config.payload_format, PayloadFormat::Registry);
        assert_eq!(config.config_file, PathBuf::from("config.json"));
        assert_eq!(config.docker_path, "/usr/bin/docker");
        assert!(config.notify_url.is_none());
        assert!(config.command_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = EnvConfig::from_vars(vars(&[
            ("PORT", "8080"),
            ("ENVIRONMENT", "staging"),
            ("WEBHOOK_FORMAT", "docker-hub"),
            ("CONFIG_FILE", "/etc/hook/targets.json"),
            ("DOCKER", "docker"),
            ("SLACK_WEBHOOK_URL", "https://hooks.slack.com/services/x"),
            ("DEPLOY_COMMAND_TIMEOUT_SECS", "120"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "staging");
        assert_eq!(config.payload_format, PayloadFormat::DockerHub);
        assert_eq!(config.config_file, PathBuf::from("/etc/hook/targets.json"));
        assert_eq!(config.docker_path, "docker");
        assert_eq!(
            config.notify_url.as_deref(),
            Some("https://hooks.slack.com/services/x")
        );
        assert_eq!(config.command_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config =
            EnvConfig::from_vars(vars(&[("SLACK_WEBHOOK_URL", ""), ("ENVIRONMENT", "")])).unwrap();
        assert!(config.notify_url.is_none());
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = EnvConfig::from_vars(vars(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "PORT", .. }));

        let err = EnvConfig::from_vars(vars(&[("WEBHOOK_FORMAT", "gitlab")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "WEBHOOK_FORMAT", .. }));
    }
}
