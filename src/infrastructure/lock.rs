//! In-process named locks
//!
//! One `tokio::sync::Mutex` per key, created on first use. Suitable for
//! single-node deployments; multi-node deployments plug a shared
//! `LockService` implementation in instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::domain::{LockHandle, LockService};
use crate::shared::{ControlPlaneError, DomainResult};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct MemoryLockService {
    locks: Arc<LockTable>,
}

impl MemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.locks.len()
    }
}

/// Forget the key once nobody holds or waits for it.
fn forget_if_idle(locks: &LockTable, key: &str) {
    locks.remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// Held inside a `LockHandle`; unlocks and prunes the table on drop, so a
/// handle that is dropped instead of released leaves nothing behind.
struct HeldKey {
    key: String,
    locks: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HeldKey {
    fn drop(&mut self) {
        // The guard owns a reference to the mutex; let go of it first.
        self.guard.take();
        forget_if_idle(&self.locks, &self.key);
    }
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn acquire(&self, key: &str, timeout: Duration) -> DomainResult<LockHandle> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let acquired = tokio::time::timeout(timeout, mutex.lock_owned()).await;
        let guard = match acquired {
            Ok(guard) => guard,
            Err(_) => {
                forget_if_idle(&self.locks, key);
                return Err(ControlPlaneError::LockTimeout {
                    key: key.to_string(),
                });
            }
        };

        debug!(key, "Lock acquired");
        Ok(LockHandle::new(
            key,
            HeldKey {
                key: key.to_string(),
                locks: self.locks.clone(),
                guard: Some(guard),
            },
        ))
    }

    async fn release(&self, handle: LockHandle) -> DomainResult<()> {
        let key = handle.key().to_string();
        drop(handle);
        debug!(key, "Lock released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_times_out_while_held() {
        let locks = MemoryLockService::new();
        let held = locks.acquire("plan:p1", Duration::from_secs(1)).await.unwrap();

        let err = locks
            .acquire("plan:p1", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlPlaneError::LockTimeout { .. }));

        locks.release(held).await.unwrap();
        let again = locks.acquire("plan:p1", Duration::from_millis(20)).await.unwrap();
        locks.release(again).await.unwrap();
        assert_eq!(locks.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = MemoryLockService::new();
        let a = locks.acquire("a", Duration::from_millis(20)).await.unwrap();
        let b = locks.acquire("b", Duration::from_millis(20)).await.unwrap();
        assert_eq!(a.key(), "a");
        assert_eq!(b.key(), "b");
    }

    #[tokio::test]
    async fn dropping_a_handle_releases_it() {
        let locks = MemoryLockService::new();
        {
            let _held = locks.acquire("k", Duration::from_millis(20)).await.unwrap();
            assert_eq!(locks.tracked_keys(), 1);
        }
        assert_eq!(locks.tracked_keys(), 0);
        assert!(locks.acquire("k", Duration::from_millis(20)).await.is_ok());
        assert_eq!(locks.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn key_survives_while_another_caller_waits() {
        let locks = Arc::new(MemoryLockService::new());
        let held = locks.acquire("k", Duration::from_secs(1)).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire("k", Duration::from_secs(1)).await })
        };
        tokio::task::yield_now().await;

        drop(held);
        let second = waiter.await.unwrap().unwrap();
        assert_eq!(locks.tracked_keys(), 1);

        drop(second);
        assert_eq!(locks.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn timed_out_waiter_does_not_leave_a_key() {
        let locks = MemoryLockService::new();
        let held = locks.acquire("k", Duration::from_secs(1)).await.unwrap();
        assert!(locks.acquire("k", Duration::from_millis(10)).await.is_err());

        drop(held);
        assert_eq!(locks.tracked_keys(), 0);
    }
}
