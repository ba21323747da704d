//! 服务层
//!
//! 部署策略与编排

pub mod delivery;
pub mod deploy;
pub mod locks;
pub mod policy;

pub use delivery::Delivery;
pub use deploy::Deployer;
pub use locks::ServiceLocks;
pub use policy::{DeploymentPolicy, EligibleDeployment};
