//! Outbound ports for collaborators that live outside this core.

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::DomainResult;

/// Proof of holding a named lock. Dropping it releases the lock.
pub struct LockHandle {
    key: String,
    _guard: Box<dyn Any + Send + Sync>,
}

impl LockHandle {
    pub fn new(key: impl Into<String>, guard: impl Any + Send + Sync) -> Self {
        Self {
            key: key.into(),
            _guard: Box::new(guard),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockHandle").field("key", &self.key).finish()
    }
}

/// Best-effort named mutual exclusion.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Fails with `LockTimeout` when the lock is not granted in time.
    async fn acquire(&self, key: &str, timeout: Duration) -> DomainResult<LockHandle>;
    async fn release(&self, handle: LockHandle) -> DomainResult<()>;
}

/// An email/telemetry message addressed by template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub project_id: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> DomainResult<()>;
}
