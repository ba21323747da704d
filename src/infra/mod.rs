//! 基础设施层
//!
//! 外部依赖适配（docker CLI、通知 webhook）

pub mod command;
pub mod notifier;

pub use command::{CommandError, CommandRunner, DockerCommand, ProcessRunner};
pub use notifier::{Notifier, NotifyError, SlackNotifier};
