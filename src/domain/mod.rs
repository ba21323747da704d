//! 领域模型
//!
//! 纯数据结构与负载解析，不依赖 axum/tokio

pub mod deploy;
pub mod payload;
pub mod push;
pub mod webhook;

pub use deploy::{DeployReport, DeployStage, DeploymentOutcome, StageStatus};
pub use payload::{decode_body, PayloadError};
pub use push::PushEvent;
pub use webhook::PayloadFormat;
