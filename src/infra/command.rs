//! 命令执行器
//!
//! Docker CLI invocations go through the [`CommandRunner`] trait so the
//! deployment sequence can be exercised with a fake runner. [`ProcessRunner`]
//! is the real implementation on top of `tokio::process`.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Docker CLI 调用
#[derive(Clone, PartialEq, Eq)]
pub struct DockerCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Written to the child's stdin, then the pipe is closed
    pub stdin: Option<String>,
}

impl DockerCommand {
    /// `docker login --username <user> --password-stdin [registry]`
    pub fn login(docker: &str, username: &str, password: &str, registry: Option<&str>) -> Self {
        let mut args = vec![
            "login".to_string(),
            "--username".to_string(),
            username.to_string(),
            "--password-stdin".to_string(),
        ];
        if let Some(registry) = registry {
            args.push(registry.to_string());
        }

        Self {
            program: docker.to_string(),
            args,
            stdin: Some(password.to_string()),
        }
    }

    /// `docker service update <service> --force --with-registry-auth --image=<image>`
    pub fn service_update(docker: &str, service: &str, image: &str) -> Self {
        Self {
            program: docker.to_string(),
            args: vec![
                "service".to_string(),
                "update".to_string(),
                service.to_string(),
                "--force".to_string(),
                "--with-registry-auth".to_string(),
                format!("--image={}", image),
            ],
            stdin: None,
        }
    }

    /// Docker subcommand (`login`, `service`)
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

// stdin carries the registry password, keep it out of logs
impl fmt::Display for DockerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DockerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerCommand")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// 命令执行错误
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn command: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to write command input: {0}")]
    StdinFailed(#[source] std::io::Error),

    #[error("Failed to wait for command: {0}")]
    WaitFailed(#[source] std::io::Error),

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Command exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// 命令执行接口
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. Any non-zero exit is an error.
    async fn run(&self, command: &DockerCommand) -> Result<(), CommandError>;
}

/// 以子进程方式执行命令
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &DockerCommand) -> Result<(), CommandError> {
        let stdin = if command.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(CommandError::SpawnFailed)?;

        if let (Some(input), Some(mut pipe)) = (&command.stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(CommandError::StdinFailed)?;
            // dropping the handle closes the pipe so the child sees EOF
        }

        // on timeout the child is dropped, and with it killed
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| CommandError::Timeout(limit))?,
            None => child.wait_with_output().await,
        }
        .map_err(CommandError::WaitFailed)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(command = %command, stdout = %stdout.trim(), "Command output");
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(program: &str, args: &[&str], stdin: Option<&str>) -> DockerCommand {
        DockerCommand {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            stdin: stdin.map(str::to_string),
        }
    }

    #[test]
    fn test_login_command() {
        let cmd = DockerCommand::login("/usr/bin/docker", "deployer", "hunter2", Some("registry.example.com"));
        assert_eq!(cmd.subcommand(), Some("login"));
        assert_eq!(
            cmd.to_string(),
            "/usr/bin/docker login --username deployer --password-stdin registry.example.com"
        );
        assert_eq!(cmd.stdin.as_deref(), Some("hunter2"));
        assert!(!format!("{:?}", cmd).contains("hunter2"));

        let cmd = DockerCommand::login("docker", "deployer", "hunter2", None);
        assert_eq!(cmd.to_string(), "docker login --username deployer --password-stdin");
    }

    #[test]
    fn test_service_update_command() {
        let cmd = DockerCommand::service_update("docker", "myapp-svc", "registry.example.com/myapp:production-42");
        assert_eq!(cmd.subcommand(), Some("service"));
        assert_eq!(
            cmd.to_string(),
            "docker service update myapp-svc --force --with-registry-auth --image=registry.example.com/myapp:production-42"
        );
        assert!(cmd.stdin.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_success() {
        let runner = ProcessRunner::default();
        assert!(runner.run(&command("echo", &["hello"], None)).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_with_stdin() {
        let runner = ProcessRunner::default();
        let result = runner
            .run(&command("sh", &["-c", "read line && test \"$line\" = hunter2"], Some("hunter2\n")))
            .await;
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_non_zero_exit() {
        let runner = ProcessRunner::default();
        let result = runner
            .run(&command("sh", &["-c", "echo boom >&2; exit 3"], None))
            .await;

        match result {
            Err(CommandError::Failed { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_not_found() {
        let runner = ProcessRunner::default();
        let result = runner
            .run(&command("nonexistent_command_12345", &[], None))
            .await;
        assert!(matches!(result, Err(CommandError::SpawnFailed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_timeout() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(100)));
        let result = runner.run(&command("sleep", &["5"], None)).await;
        assert!(matches!(result, Err(CommandError::Timeout(_))));
    }
}
