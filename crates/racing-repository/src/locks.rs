//! Per-key locks serializing cache-aside lookups of shared records.
//!
//! Concurrent traversal tasks resolve the same jockey or trainer from many
//! runners. Without a lock, two tasks can both miss the store and both
//! insert a scraped copy. Holding the key's lock across the whole
//! expire-find-scrape-save sequence leaves at most one document per key.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Prune dead entries once the map grows past this size.
const PRUNE_THRESHOLD: usize = 128;

/// Lazily created mutexes, one per live key.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        if locks.len() > PRUNE_THRESHOLD {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }
        if let Some(existing) = locks.get(key).and_then(Weak::upgrade) {
            return existing;
        }
        let lock = Arc::new(Mutex::new(()));
        let _ = locks.insert(key.to_owned(), Arc::downgrade(&lock));
        lock
    }

    /// Run `f` while holding the lock for `key`.
    pub(crate) fn with<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.acquire(key);
        let _guard = lock.lock();
        f()
    }

    #[cfg(test)]
    fn live(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
