//! Per-checksum mutual exclusion
//!
//! At most one materialization is in flight per checksum. Requests for
//! different checksums never wait on each other.

use crate::checksum::Checksum;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Lock table keyed by checksum
///
/// Entries are weak so a checksum's lock is dropped once no request holds
/// or waits on it.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<Checksum, Weak<AsyncMutex<()>>>>,
}

/// Held for the duration of one record's lookup-or-create and derivation
pub struct KeyedGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &Checksum) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = locks.get(key).and_then(Weak::upgrade) {
            return existing;
        }

        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(key.clone(), Arc::downgrade(&lock));
        lock
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &Checksum) -> KeyedGuard {
        let lock = self.entry(key);
        let guard = match lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Waiting for in-flight derivation of {}", key);
                lock.lock_owned().await
            }
        };
        KeyedGuard { _guard: guard }
    }

    /// Number of checksums with a live lock
    pub(crate) fn len(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|lock| lock.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{checksum, Algorithm};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let key = checksum("X", Algorithm::Sha1).unwrap();

        let guard = locks.lock(&key).await;

        let waiter = {
            let locks = locks.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let _g = locks.lock(&key).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let a = checksum("A", Algorithm::Sha1).unwrap();
        let b = checksum("B", Algorithm::Sha1).unwrap();

        let _ga = locks.lock(&a).await;
        let gb = tokio::time::timeout(Duration::from_millis(100), locks.lock(&b)).await;
        assert!(gb.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_dropped() {
        let locks = KeyedLocks::new();
        let key = checksum("X", Algorithm::Sha1).unwrap();

        {
            let _g = locks.lock(&key).await;
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }
}
