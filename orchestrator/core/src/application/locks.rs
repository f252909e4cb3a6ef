// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Per-key async mutual exclusion.
//!
//! Mutations of one aggregate serialize on that aggregate's lock; different
//! keys proceed in parallel. Callers that hold several locks at once must
//! take them in a fixed order (instance before workflow, instances sorted by
//! id) to stay deadlock free.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap<K> = DashMap<K, Arc<Mutex<()>>>;

pub struct KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    locks: Arc<LockMap<K>>,
}

/// Exclusive hold on one key. The map entry is dropped with the last guard
/// or waiter, so lookups of unknown ids leave nothing behind.
pub struct KeyGuard<K>
where
    K: Eq + Hash + Clone,
{
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap<K>>,
    key: K,
}

impl<K> Drop for KeyGuard<K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts as a holder.
        self.guard.take();
        // `acquire` clones the Arc under the same shard lock, so a count of one
        // means nobody holds or awaits this key.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: &K) -> KeyGuard<K> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        KeyGuard {
            guard: Some(guard),
            locks: self.locks.clone(),
            key: key.clone(),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
