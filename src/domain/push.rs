//! 镜像推送事件

use std::fmt;

/// 规范化后的镜像推送事件
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PushEvent {
    pub repository: String,
    pub tag: String,
}

impl PushEvent {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Full image reference, `repository:tag`
    pub fn image(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

impl fmt::Display for PushEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}
