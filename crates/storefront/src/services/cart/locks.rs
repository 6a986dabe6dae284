//! Per-user mutation locks.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use corner_shop_core::UserId;

/// Keyed async mutexes, one per user, dropped after a period of disuse.
///
/// A lock evicted while held is simply recreated; the cart version check
/// still rejects the losing write in that case.
#[derive(Clone)]
pub struct UserLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
}

impl UserLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(Duration::from_secs(600)) // 10 minutes
                .build(),
        }
    }

    /// Wait for exclusive access to a user's cart.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(user_id, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new()
    }
}
