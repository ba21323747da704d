//! 部署目标配置
//!
//! The config file maps each environment to the images it deploys:
//!
//! ```json
//! {
//!   "production": {
//!     "registry.example.com/myapp": { "service": "myapp-svc" }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::config::ConfigError;

/// 部署目标
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Swarm service updated with the new image
    pub service: String,
}

/// 当前环境的镜像 -> 部署目标映射
#[derive(Clone, Debug, Default)]
pub struct DeploymentTargets {
    targets: HashMap<String, DeploymentTarget>,
}

impl DeploymentTargets {
    pub fn new(targets: HashMap<String, DeploymentTarget>) -> Self {
        Self { targets }
    }

    /// Read the config file and select the section for `environment`
    pub fn load(path: &Path, environment: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, environment, path)
    }

    /// Parse config file content. `origin` is only used in error messages.
    pub fn from_json(raw: &str, environment: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut sections: HashMap<String, HashMap<String, DeploymentTarget>> =
            serde_json::from_str(raw).map_err(|source| ConfigError::ParseConfig {
                path: origin.to_path_buf(),
                source,
            })?;

        let targets = sections
            .remove(environment)
            .ok_or_else(|| ConfigError::MissingEnvironment(environment.to_string()))?;

        Ok(Self { targets })
    }

    pub fn get(&self, image_key: &str) -> Option<&DeploymentTarget> {
        self.targets.get(image_key)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeploymentTarget)> {
        self.targets.iter()
    }
}
