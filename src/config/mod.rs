//! 配置模块
//!
//! 启动时一次性加载到 [`Settings`]；加载失败则不启动服务。

pub mod env;
pub mod secrets;
pub mod targets;

use std::path::PathBuf;
use thiserror::Error;

pub use env::EnvConfig;
pub use secrets::{Credentials, RegistryAuth};
pub use targets::{DeploymentTarget, DeploymentTargets};

/// 启动配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("You must set a token, username and password")]
    MissingCredentials,

    #[error("Failed to read {var} from {path}: {source}")]
    SecretFile {
        var: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No deployment targets configured for environment '{0}'")]
    MissingEnvironment(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// 进程配置（只读）
#[derive(Clone, Debug)]
pub struct Settings {
    pub env: EnvConfig,
    pub credentials: Credentials,
    pub targets: DeploymentTargets,
}

impl Settings {
    /// 从进程环境变量加载
    pub fn load() -> Result<Self, ConfigError> {
        Self::assemble(EnvConfig::from_env()?, Credentials::from_env()?)
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::assemble(EnvConfig::from_vars(&var)?, Credentials::from_vars(&var)?)
    }

    fn assemble(env: EnvConfig, credentials: Credentials) -> Result<Self, ConfigError> {
        let targets = DeploymentTargets::load(&env.config_file, &env.environment)?;

        tracing::info!(
            environment = %env.environment,
            payload_format = env.payload_format.name(),
            config_file = %env.config_file.display(),
            registry = credentials.registry.display_host(),
            notifications = env.notify_url.is_some(),
            target_count = targets.len(),
            "Loaded configuration"
        );

        for (image, target) in targets.iter() {
            tracing::info!(image = %image, service = %target.service, "Registered deployment target");
        }

        Ok(Self {
            env,
            credentials,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_settings_from_vars() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "production": { "registry.example.com/myapp": { "service": "myapp-svc" } } }"#)
            .unwrap();

        let map: HashMap<&str, String> = HashMap::from([
            ("CONFIG_FILE", file.path().display().to_string()),
            ("TOKEN", "s3cret".to_string()),
            ("USERNAME", "deployer".to_string()),
            ("PASSWORD", "hunter2".to_string()),
        ]);

        let settings = Settings::from_vars(|key| map.get(key).cloned()).unwrap();
        assert_eq!(settings.env.environment, "production");
        assert_eq!(settings.credentials.token, "s3cret");
        assert_eq!(settings.targets.len(), 1);
    }

    #[test]
    fn test_settings_require_credentials() {
        let map: HashMap<&str, String> = HashMap::from([("TOKEN", "s3cret".to_string())]);
        let err = Settings::from_vars(|key| map.get(key).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }
}
