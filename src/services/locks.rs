//! 服务级部署锁
//!
//! Two pushes for the same service must not interleave their login/update
//! commands. Deployments of different services still run in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 每个服务一把异步锁，按需创建
#[derive(Debug, Default)]
pub struct ServiceLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ServiceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other deployment of `service` is running.
    /// The service stays locked until the guard is dropped.
    pub async fn acquire(&self, service: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(service.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Whether a deployment of `service` currently holds the lock
    pub async fn is_locked(&self, service: &str) -> bool {
        let locks = self.locks.lock().await;
        locks
            .get(service)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_service_is_serialized() {
        let locks = Arc::new(ServiceLocks::new());
        let guard = locks.acquire("myapp-svc").await;
        assert!(locks.is_locked("myapp-svc").await);

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("myapp-svc").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire the lock")
            .unwrap();
        assert!(!locks.is_locked("myapp-svc").await);
    }

    #[tokio::test]
    async fn test_different_services_do_not_block() {
        let locks = ServiceLocks::new();
        let _a = locks.acquire("a-svc").await;
        let acquired = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b-svc")).await;
        assert!(acquired.is_ok());
        assert!(!locks.is_locked("c-svc").await);
    }
}
