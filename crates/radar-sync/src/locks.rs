//! # Per-Key Write Ordering
//!
//! One async mutex per (facility, field) pair.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KeyLocks                                         │
//! │                                                                         │
//! │  (ztl-id, SplitAssignments) ──► Mutex ─┐                               │
//! │  (ztl-id, Notices)          ──► Mutex  │  independent keys never wait  │
//! │  (zjx-id, Notices)          ──► Mutex  │  on each other                │
//! │                                         │                               │
//! │  update A ──lock──► commit A ──► publish A ──unlock                    │
//! │  update B ─────────────wait──────────────────► commit B ──► publish B  │
//! │                                                                         │
//! │  Publish order for a key equals commit order for that key.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use radar_core::ConfigField;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Key = (String, ConfigField);
type LockMap = DashMap<Key, Arc<Mutex<()>>>;

/// Registry of per-(facility, field) async mutexes.
///
/// An entry lives only while some task holds or waits on it, so ids that
/// never resolve to a facility leave nothing behind.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one key. Releasing the last claim removes the entry.
#[derive(Debug)]
pub struct KeyGuard {
    locks: Arc<LockMap>,
    key: Key,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Unlock first so the mutex Arc held by the guard is gone
        self.guard.take();
        // Waiters clone the Arc under the same shard lock, so a count of one
        // means only the map still refers to it
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to one key.
    ///
    /// The guard is owned so it can be held across `.await` points and moved
    /// into spawned tasks.
    pub async fn lock(&self, facility_id: &str, field: ConfigField) -> KeyGuard {
        let key = (facility_id.to_string(), field);

        // Clone the Arc out so the map shard is not held while waiting
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        KeyGuard {
            locks: self.locks.clone(),
            key,
            guard: Some(mutex.lock_owned().await),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no key is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let guard = locks.lock("ztl", ConfigField::Notices).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock("ztl", ConfigField::Notices).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = KeyLocks::new();
        let _split = locks.lock("ztl", ConfigField::SplitAssignments).await;

        // Would deadlock if keys shared a mutex
        let _notices = locks.lock("ztl", ConfigField::Notices).await;
        let _other = locks.lock("zjx", ConfigField::SplitAssignments).await;

        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = KeyLocks::new();
        for i in 0..100 {
            let _g = locks.lock(&format!("unknown-{}", i), ConfigField::Notices).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_kept_while_awaited() {
        let locks = Arc::new(KeyLocks::new());
        let guard = locks.lock("ztl", ConfigField::Notices).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock("ztl", ConfigField::Notices).await;
                locks.len()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        // The waiter still refers to the entry when the first holder leaves
        assert_eq!(contender.await.unwrap(), 1);
        assert!(locks.is_empty());
    }
}
