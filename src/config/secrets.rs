//! 密钥加载
//!
//! Every secret can be given directly (`TOKEN`) or as a path to a file holding
//! it (`TOKEN_FILE`), which is how Docker secrets are mounted. The file form is
//! checked first and its content is trimmed.

use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;

/// 镜像仓库登录凭据
#[derive(Clone)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    /// Registry host; `None` means docker's default registry
    pub host: Option<String>,
}

impl RegistryAuth {
    /// Human-readable registry name for log lines and notifications
    pub fn display_host(&self) -> &str {
        self.host.as_deref().unwrap_or("the default registry")
    }
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .finish()
    }
}

/// 启动时加载的凭据
#[derive(Clone)]
pub struct Credentials {
    /// Shared secret expected in `Authorization: Bearer <token>`
    pub token: String,
    pub registry: RegistryAuth,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("registry", &self.registry)
            .finish()
    }
}

impl Credentials {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    ///
    /// Token, username and password must all resolve to non-empty values.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = resolve_secret(&var, "TOKEN")?;
        let username = resolve_secret(&var, "USERNAME")?;
        let password = resolve_secret(&var, "PASSWORD")?;
        let host = var("REGISTRY").filter(|v| !v.is_empty());

        match (token, username, password) {
            (Some(token), Some(username), Some(password)) => Ok(Self {
                token,
                registry: RegistryAuth {
                    username,
                    password,
                    host,
                },
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Resolve `NAME_FILE` first, then `NAME`. Empty values resolve to `None`.
pub fn resolve_secret<F>(var: &F, name: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file_var = format!("{}_FILE", name);
    if let Some(path) = var(&file_var).filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::SecretFile {
            var: file_var,
            path,
            source,
        })?;
        let value = content.trim().to_string();
        return Ok(Some(value).filter(|v| !v.is_empty()));
    }

    Ok(var(name).filter(|v| !v.is_empty()))
}
