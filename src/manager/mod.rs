//! The manager: cache hierarchy, task table, and the three core algorithms.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Manager                                                      │
//! │                                                              │
//! │   caches: Namespace ──► NamespaceCache                       │
//! │                           ├── root  (insertion order + labels)│
//! │                           └── groups: name ──► CacheNode     │
//! │                                                              │
//! │   tasks: generational arena of Task                          │
//! │   links: RawLink ──► TaskId   (non-owning lookup)            │
//! │   ops:   NamespaceKind ──► {clear, mute, unmute, ...}        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Grouped tasks are indexed twice (group node and namespace root) so a
//! namespace sweep never enumerates groups. All mutation is synchronous
//! within one call stack; the host re-enters only through
//! [`Manager::fire`].

pub mod cache;
pub mod cancel;
pub mod mark;
pub mod register;
pub mod task;

pub use cache::{GroupMatch, GroupPattern};
pub use cancel::{CancelOpts, Selector, TaskFilter};
pub use register::{Join, RegisterSpec};
pub use task::{ClearContext, Task};

use crate::types::{Marker, Namespace, NamespaceKind, RawLink, TaskId};
use crate::util::Arena;
use crate::worker::{WorkerHandle, WorkerRegistry};
use cache::NamespaceCache;
use core::fmt;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Group-name marker exempting tasks from broad "cancel all" sweeps.
///
/// A group like `gc:zombie` holds long-lived housekeeping tasks that must
/// survive a general teardown but can still be cancelled by explicit
/// id/label/group targets.
pub const ZOMBIE_MARKER: &str = ":zombie";

/// Maximum label-collision forwarding depth for joined futures.
pub const MAX_FORWARD_DEPTH: u32 = 16;

/// Auto-allocated links start high so they never collide with
/// wrapper-returned platform handles.
const AUTO_LINK_BASE: u64 = 1 << 48;

pub(crate) fn is_zombie_group(group: &str) -> bool {
    group.contains(ZOMBIE_MARKER)
}

/// Per-kind handler table for the manager-wide sweeps.
///
/// Populated at construction; replaces name-derived dynamic dispatch with
/// explicit function pointers. Each handler receives the backing kind and
/// is responsible for both the plain and the promisified partition.
#[derive(Clone, Copy)]
pub struct NamespaceOps {
    /// Cancel everything for this kind.
    pub clear: fn(&mut Manager, NamespaceKind),
    /// Mute everything for this kind.
    pub mute: fn(&mut Manager, NamespaceKind),
    /// Unmute everything for this kind.
    pub unmute: fn(&mut Manager, NamespaceKind),
    /// Pause everything for this kind.
    pub suspend: fn(&mut Manager, NamespaceKind),
    /// Unpause everything for this kind.
    pub unsuspend: fn(&mut Manager, NamespaceKind),
}

impl fmt::Debug for NamespaceOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceOps").finish_non_exhaustive()
    }
}

fn both_partitions(kind: NamespaceKind) -> [Namespace; 2] {
    [Namespace::new(kind), Namespace::promisified(kind)]
}

fn default_clear(manager: &mut Manager, kind: NamespaceKind) {
    for namespace in both_partitions(kind) {
        manager.cancel(Selector::All, namespace);
    }
}

fn default_mark(marker: Marker) -> impl Fn(&mut Manager, NamespaceKind) {
    move |manager, kind| {
        for namespace in both_partitions(kind) {
            manager.mark(marker, Selector::All, namespace);
        }
    }
}

fn default_mute(manager: &mut Manager, kind: NamespaceKind) {
    default_mark(Marker::Muted)(manager, kind);
}

fn default_unmute(manager: &mut Manager, kind: NamespaceKind) {
    default_mark(Marker::Unmuted)(manager, kind);
}

fn default_suspend(manager: &mut Manager, kind: NamespaceKind) {
    default_mark(Marker::Paused)(manager, kind);
}

fn default_unsuspend(manager: &mut Manager, kind: NamespaceKind) {
    default_mark(Marker::Unpaused)(manager, kind);
}

impl Default for NamespaceOps {
    fn default() -> Self {
        Self {
            clear: default_clear,
            mute: default_mute,
            unmute: default_unmute,
            suspend: default_suspend,
            unsuspend: default_unsuspend,
        }
    }
}

/// Owns every registered task and the cache hierarchy that indexes them.
///
/// Single-threaded cooperative: the manager is not shared between threads,
/// and every operation completes synchronously within one call stack. The
/// host platform re-enters through [`Manager::fire`] with a token it was
/// handed at arm time, never concurrently for the same task.
pub struct Manager {
    pub(crate) tasks: Arena<task::Task>,
    pub(crate) caches: BTreeMap<Namespace, NamespaceCache>,
    pub(crate) links: HashMap<RawLink, TaskId>,
    next_link: u64,
    pub(crate) locked: bool,
    ops: BTreeMap<NamespaceKind, NamespaceOps>,
    workers: WorkerRegistry,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// Creates a manager with the default per-kind ops table.
    #[must_use]
    pub fn new() -> Self {
        let ops = NamespaceKind::ALL
            .into_iter()
            .map(|kind| (kind, NamespaceOps::default()))
            .collect();
        Self {
            tasks: Arena::new(),
            caches: BTreeMap::new(),
            links: HashMap::new(),
            next_link: AUTO_LINK_BASE,
            locked: false,
            ops,
            workers: WorkerRegistry::new(),
        }
    }

    /// Freezes the manager: every later [`register`](Self::register) call
    /// silently returns `None`. Cancellation and marking keep working, so
    /// teardown can still drain what exists.
    pub fn lock(&mut self) -> &mut Self {
        self.locked = true;
        self
    }

    /// Whether the manager is frozen.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Replaces the sweep handlers for one namespace kind.
    pub fn set_namespace_ops(&mut self, kind: NamespaceKind, ops: NamespaceOps) -> &mut Self {
        self.ops.insert(kind, ops);
        self
    }

    /// Whether `id` resolves to a live task.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks
            .get(id.arena())
            .is_some_and(|task| !task.unregistered)
    }

    /// Read access to a live task's bookkeeping record.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&task::Task> {
        self.tasks.get(id.arena()).filter(|task| !task.unregistered)
    }

    /// Number of tasks indexed at the namespace root.
    #[must_use]
    pub fn task_count(&self, namespace: Namespace) -> usize {
        self.caches
            .get(&namespace)
            .map_or(0, |cache| cache.root.len())
    }

    /// Resolves a label to the task currently holding it.
    #[must_use]
    pub fn resolve_label(
        &self,
        namespace: Namespace,
        group: Option<&str>,
        label: &str,
    ) -> Option<TaskId> {
        let cache = self.caches.get(&namespace)?;
        let node = match group {
            Some(name) => cache.group(name)?,
            None => &cache.root,
        };
        node.label(label)
    }

    /// Resolves a platform link to its task, if the task is still live.
    ///
    /// Pure lookup: holding a link never keeps a task alive.
    #[must_use]
    pub fn lookup_link(&self, link: RawLink) -> Option<TaskId> {
        self.links.get(&link).copied().filter(|id| self.contains(*id))
    }

    pub(crate) fn alloc_link(&mut self) -> RawLink {
        let link = RawLink(self.next_link);
        self.next_link += 1;
        link
    }

    /// Detaches a task from the arena and every index that holds it, and
    /// marks it unregistered. The caller decides which handlers still run.
    pub(crate) fn remove_task(&mut self, id: TaskId) -> Option<task::Task> {
        let mut task = self.tasks.remove(id.arena())?;
        task.unregistered = true;
        if let Some(link) = task.link {
            self.links.remove(&link);
        }
        if let Some(cache) = self.caches.get_mut(&task.namespace) {
            cache.root.remove_id(id);
            match task.group.as_deref() {
                Some(name) => {
                    if let Some(node) = cache.groups.get_mut(name) {
                        node.remove_id(id);
                        if let Some(label) = task.label.as_deref() {
                            node.remove_label_if(label, id);
                        }
                    }
                }
                None => {
                    if let Some(label) = task.label.as_deref() {
                        cache.root.remove_label_if(label, id);
                    }
                }
            }
        }
        Some(task)
    }

    fn used_kinds(&self) -> BTreeSet<NamespaceKind> {
        self.caches.keys().map(|namespace| namespace.kind()).collect()
    }

    fn sweep_all(&mut self, pick: fn(&NamespaceOps) -> fn(&mut Manager, NamespaceKind)) {
        for kind in self.used_kinds() {
            let Some(ops) = self.ops.get(&kind) else {
                continue;
            };
            let handler = pick(ops);
            handler(self, kind);
        }
    }

    /// Cancels every task in every namespace used so far.
    ///
    /// Promisified partitions are torn down through their backing kind's
    /// handler; zombie groups survive (the sweep runs with reason `all`).
    pub fn clear_all(&mut self) -> &mut Self {
        self.sweep_all(|ops| ops.clear);
        self
    }

    /// Mutes every task in every namespace used so far.
    pub fn mute_all(&mut self) -> &mut Self {
        self.sweep_all(|ops| ops.mute);
        self
    }

    /// Unmutes every task in every namespace used so far.
    pub fn unmute_all(&mut self) -> &mut Self {
        self.sweep_all(|ops| ops.unmute);
        self
    }

    /// Pauses every task in every namespace used so far.
    pub fn suspend_all(&mut self) -> &mut Self {
        self.sweep_all(|ops| ops.suspend);
        self
    }

    /// Unpauses every task in every namespace used so far, flushing their
    /// pending queues.
    pub fn unsuspend_all(&mut self) -> &mut Self {
        self.sweep_all(|ops| ops.unsuspend);
        self
    }

    /// Registers a shared worker, incrementing its reference count.
    ///
    /// Returns the count after registration. Repeat registrations of the
    /// same object only increment; the registry holds a weak reference and
    /// never extends the worker's lifetime.
    pub fn register_worker<W>(&mut self, worker: &Arc<W>) -> usize
    where
        W: WorkerHandle + 'static,
    {
        self.workers.register(worker)
    }

    /// Decrements a worker's reference count.
    ///
    /// Returns true when this call dropped the count to zero and invoked
    /// the worker's real teardown (exactly once per lifecycle).
    pub fn terminate_worker<W>(&mut self, worker: &Arc<W>) -> bool
    where
        W: WorkerHandle + 'static,
    {
        self.workers.terminate(worker)
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("tasks", &self.tasks.len())
            .field("namespaces", &self.caches.len())
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const NS: Namespace = Namespace::new(NamespaceKind::Timeout);

    #[test]
    fn locked_manager_rejects_registration_silently() {
        let mut manager = Manager::new();
        manager.lock();
        assert!(manager.register(RegisterSpec::new(NS)).is_none());
        assert_eq!(manager.task_count(NS), 0);
    }

    #[test]
    fn task_record_embeds_its_returned_id() {
        let mut manager = Manager::new();
        let id = manager.register(RegisterSpec::new(NS)).unwrap();
        assert_eq!(manager.task(id).unwrap().id(), id);
    }

    #[test]
    fn join_wait_attaches_instead_of_creating() {
        let mut manager = Manager::new();
        let merged = Rc::new(Cell::new(0));
        let first = manager
            .register(RegisterSpec::new(NS).label("fetch"))
            .unwrap();
        let seen = Rc::clone(&merged);
        let second = manager
            .register(
                RegisterSpec::new(NS)
                    .label("fetch")
                    .join(Join::Wait)
                    .on_merge(move |task| {
                        assert_eq!(task.label(), Some("fetch"));
                        seen.set(seen.get() + 1);
                    }),
            )
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(merged.get(), 1);
        assert_eq!(manager.task_count(NS), 1);
    }

    #[test]
    fn collision_cancels_incumbent_before_replacement_resolves() {
        let mut manager = Manager::new();
        let reasons = Rc::new(RefCellVec::default());
        let seen = Rc::clone(&reasons);
        let first = manager
            .register(
                RegisterSpec::new(NS)
                    .group("ui")
                    .label("spinner")
                    .on_clear(move |ctx| seen.push(ctx.reason)),
            )
            .unwrap();
        let second = manager
            .register(RegisterSpec::new(NS).group("ui").label("spinner"))
            .unwrap();
        assert_ne!(first, second);
        assert!(!manager.contains(first));
        assert_eq!(
            manager.resolve_label(NS, Some("ui"), "spinner"),
            Some(second)
        );
        assert_eq!(reasons.take(), vec![crate::types::CancelReason::Collision]);
    }

    #[test]
    fn lookup_link_is_non_owning() {
        let mut manager = Manager::new();
        let id = manager
            .register(
                RegisterSpec::new(NS)
                    .wrapper(|_token| Some(RawLink(42)))
                    .link_by_wrapper(),
            )
            .unwrap();
        assert_eq!(manager.lookup_link(RawLink(42)), Some(id));
        manager.cancel(Selector::id(id), NS);
        assert_eq!(manager.lookup_link(RawLink(42)), None);
    }

    #[test]
    fn clear_all_covers_promisified_partitions() {
        let mut manager = Manager::new();
        let promise = Namespace::promisified(NamespaceKind::Proxy);
        let id = manager.register(RegisterSpec::new(promise)).unwrap();
        manager.clear_all();
        assert!(!manager.contains(id));
    }

    #[derive(Default)]
    struct RefCellVec(std::cell::RefCell<Vec<crate::types::CancelReason>>);

    impl RefCellVec {
        fn push(&self, reason: crate::types::CancelReason) {
            self.0.borrow_mut().push(reason);
        }
        fn take(&self) -> Vec<crate::types::CancelReason> {
            self.0.take()
        }
    }
}
