//! Per-partition write locks.

use crate::types::VersionKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A registry of mutexes keyed by version partition.
///
/// Writers for the same `(documentId, schemaName, locale)` are serialized;
/// writers for different partitions never wait on each other. Slots are
/// created on demand and removed once no thread holds or awaits them.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<VersionKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`.
    ///
    /// The slot is released even if `f` panics.
    pub fn with_lock<R>(&self, key: &VersionKey, f: impl FnOnce() -> R) -> R {
        let slot = Arc::clone(self.slots.lock().entry(key.clone()).or_default());
        let release = SlotRelease {
            locks: self,
            key,
            slot: Some(slot),
        };
        let _held = release.slot.as_ref().map(|slot| slot.lock());
        f()
    }

    /// Number of partitions with a live slot.
    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Drops a slot handle and removes the slot once it is unused.
struct SlotRelease<'a> {
    locks: &'a KeyedLocks,
    key: &'a VersionKey,
    slot: Option<Arc<Mutex<()>>>,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        // Clones are taken and released under the registry lock, so a count
        // of two (registry + ours) means nobody else is waiting.
        let mut slots = self.locks.slots.lock();
        let last = self
            .slot
            .take()
            .is_some_and(|slot| Arc::strong_count(&slot) == 2);
        if last {
            slots.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn serializes_same_key() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let key = VersionKey::new("doc-1", "post", "en");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (locks, inside, max_inside, key) =
                    (Arc::clone(&locks), Arc::clone(&inside), Arc::clone(&max_inside), key.clone());
                thread::spawn(move || {
                    for _ in 0..50 {
                        locks.with_lock(&key, || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let en = VersionKey::new("doc-1", "post", "en");
        let fr = VersionKey::new("doc-1", "post", "fr");
        let value = locks.with_lock(&en, || {
            assert_eq!(locks.active(), 1);
            locks.with_lock(&fr, || 7)
        });
        assert_eq!(value, 7);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn panicking_writer_releases_its_slot() {
        let locks = KeyedLocks::new();
        let key = VersionKey::new("doc-1", "post", "en");

        let outcome: thread::Result<()> = std::panic::catch_unwind(AssertUnwindSafe(|| {
            locks.with_lock(&key, || panic!("writer failed"))
        }));
        assert!(outcome.is_err());
        assert_eq!(locks.active(), 0);

        assert_eq!(locks.with_lock(&key, || 1), 1);
        assert_eq!(locks.active(), 0);
    }
}
