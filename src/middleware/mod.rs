//! 中间件

pub mod auth;

pub use auth::{verify_bearer_token, RequireBearerToken};
