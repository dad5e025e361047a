//! Worker reference counting.
//!
//! Several independent call sites may share one worker handle; the
//! registry counts registrations per object identity and fires the real
//! teardown only when the count returns to zero, guarding against double
//! destruction. Only a weak reference is held: the registry never extends
//! a worker's lifetime, and an entry whose worker was dropped by every
//! owner is purged on the next registry operation.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Teardown capability a registered worker must expose.
///
/// Resolved once at registration time, replacing duck-typed probing for
/// conventionally-named terminate methods: call sites that wrap a foreign
/// primitive implement or adapt to this trait instead.
pub trait WorkerHandle {
    /// Tears the worker down. Invoked exactly once per lifecycle, when the
    /// last registration is terminated.
    fn terminate(&self);
}

struct WorkerEntry {
    count: usize,
    handle: Weak<dyn WorkerHandle>,
}

/// Registry of shared workers keyed by object identity.
pub(crate) struct WorkerRegistry {
    entries: HashMap<usize, WorkerEntry>,
}

impl WorkerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Drops entries whose worker has no strong owners left.
    ///
    /// A dead entry's key is a freed address that a later allocation can
    /// reuse, so stale entries must never survive past the next lookup.
    fn purge_dead(&mut self) {
        self.entries
            .retain(|_, entry| entry.handle.strong_count() > 0);
    }

    /// Increments the count for `worker`, returning the new count.
    pub(crate) fn register<W>(&mut self, worker: &Arc<W>) -> usize
    where
        W: WorkerHandle + 'static,
    {
        self.purge_dead();
        let key = Arc::as_ptr(worker) as usize;
        let entry = self.entries.entry(key).or_insert_with(|| WorkerEntry {
            count: 0,
            handle: Arc::downgrade(worker) as Weak<dyn WorkerHandle>,
        });
        entry.count += 1;
        entry.count
    }

    /// Decrements the count for `worker`.
    ///
    /// Returns true when the count reached zero and the teardown ran.
    /// Terminating an unknown worker is a no-op.
    pub(crate) fn terminate<W>(&mut self, worker: &Arc<W>) -> bool
    where
        W: WorkerHandle + 'static,
    {
        self.purge_dead();
        let key = Arc::as_ptr(worker) as usize;
        let Some(entry) = self.entries.get_mut(&key) else {
            return false;
        };
        entry.count -= 1;
        if entry.count > 0 {
            return false;
        }
        let handle = self
            .entries
            .remove(&key)
            .expect("entry present above")
            .handle;
        if let Some(worker) = handle.upgrade() {
            worker.terminate();
        }
        true
    }
}
