use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{BoxError, CoreError, CoreResult};

/// Distributed mutual exclusion with a bounded lease.
#[async_trait]
pub trait LockService: Send + Sync {
    /// One attempt, never waits. `false` means somebody else holds `key`.
    /// The lock lapses on its own after `ttl` if never released.
    async fn acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, BoxError>;

    /// Releases `key` only if `owner` still holds it.
    async fn release(&self, key: &str, owner: &str) -> Result<(), BoxError>;
}

/// Runs `critical` while holding `key`, releasing it afterwards whatever the
/// outcome. A held lock fails fast with [`CoreError::SlotLocked`].
pub async fn with_lock<T, Fut>(
    locks: &dyn LockService,
    key: &str,
    ttl: Duration,
    critical: Fut,
) -> CoreResult<T>
where
    Fut: Future<Output = CoreResult<T>>,
{
    let owner = Uuid::new_v4().to_string();

    let acquired = locks
        .acquire(key, &owner, ttl)
        .await
        .map_err(CoreError::internal)?;

    if !acquired {
        debug!("Lock {} is held elsewhere", key);
        return Err(CoreError::SlotLocked);
    }

    let result = critical.await;

    if let Err(e) = locks.release(key, &owner).await {
        // Lease expiry cleans up after us.
        warn!("Failed to release lock {}: {}", key, e);
    }

    result
}
