//! Registration and the invocation shim.

use crate::manager::cancel::CancelOpts;
use crate::manager::task::{
    ClearContext, CompletePair, FireData, ForwardSink, Task,
};
use crate::manager::Manager;
use crate::types::{CancelReason, FireToken, Namespace, RawLink, TaskId};
use core::fmt;
use smallvec::SmallVec;
use std::any::Any;

/// Policy when a registration's label is already held by a live task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Join {
    /// No joining: the incumbent is cancelled with reason `collision` and
    /// the new task takes the label.
    #[default]
    None,
    /// Attach to the in-flight task instead of creating a new one.
    Wait,
    /// Displace the incumbent like [`Join::None`], but completion handlers
    /// the incumbent carried forward onto the replacement (bounded depth).
    Replace,
}

/// Everything `register` needs to create one task.
///
/// Built with the method chain and handed to
/// [`Manager::register`](crate::Manager::register).
pub struct RegisterSpec {
    pub(crate) namespace: Namespace,
    pub(crate) group: Option<String>,
    pub(crate) label: Option<String>,
    pub(crate) periodic: bool,
    pub(crate) join: Join,
    pub(crate) payload: Option<crate::manager::task::Payload>,
    pub(crate) wrapper: Option<crate::manager::task::Wrapper>,
    pub(crate) link_by_wrapper: bool,
    pub(crate) destructor: Option<crate::manager::task::Destructor>,
    pub(crate) on_clear: SmallVec<[crate::manager::task::ClearHandler; 1]>,
    pub(crate) on_merge: Vec<crate::manager::task::MergeHandler>,
    pub(crate) on_muted_call: SmallVec<[crate::manager::task::MutedHandler; 1]>,
    pub(crate) on_complete: SmallVec<[CompletePair; 1]>,
}

impl RegisterSpec {
    /// Starts a spec for the given namespace.
    #[must_use]
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
            group: None,
            label: None,
            periodic: false,
            join: Join::None,
            payload: None,
            wrapper: None,
            link_by_wrapper: false,
            destructor: None,
            on_clear: SmallVec::new(),
            on_merge: Vec::new(),
            on_muted_call: SmallVec::new(),
            on_complete: SmallVec::new(),
        }
    }

    /// Registers the task under a group.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Registers the task under a group, when one is given.
    #[must_use]
    pub fn maybe_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    /// Registers the task under a label (at most one live task per label
    /// per cache node).
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Registers the task under a label, when one is given.
    #[must_use]
    pub fn maybe_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// Marks the task periodic: the payload re-runs on every fire and the
    /// task stays registered until cancelled.
    #[must_use]
    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    /// Sets the label-collision policy.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    /// Sets the task's payload.
    #[must_use]
    pub fn payload<F>(mut self, payload: F) -> Self
    where
        F: FnMut(Option<&dyn Any>) + 'static,
    {
        self.payload = Some(Box::new(payload));
        self
    }

    /// Sets the arm wrapper: the closure that performs the real platform
    /// call at registration time.
    #[must_use]
    pub fn wrapper<F>(mut self, wrapper: F) -> Self
    where
        F: FnOnce(FireToken) -> Option<RawLink> + 'static,
    {
        self.wrapper = Some(Box::new(wrapper));
        self
    }

    /// Adopts the wrapper's return value as the task link.
    #[must_use]
    pub fn link_by_wrapper(mut self) -> Self {
        self.link_by_wrapper = true;
        self
    }

    /// Sets the platform teardown callback.
    #[must_use]
    pub fn destructor<F>(mut self, destructor: F) -> Self
    where
        F: FnMut(RawLink) + 'static,
    {
        self.destructor = Some(Box::new(destructor));
        self
    }

    /// Adds a handler run exactly once when the task is cancelled.
    #[must_use]
    pub fn on_clear<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&ClearContext<'_>) + 'static,
    {
        self.on_clear.push(Box::new(handler));
        self
    }

    /// Adds a handler run against the in-flight task when this registration
    /// joins it instead of creating a new task.
    #[must_use]
    pub fn on_merge<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&mut Task) + 'static,
    {
        self.on_merge.push(Box::new(handler));
        self
    }

    /// Adds a handler run instead of the payload when a muted task fires.
    #[must_use]
    pub fn on_muted_call<F>(mut self, handler: F) -> Self
    where
        F: FnMut(Option<&dyn Any>) + 'static,
    {
        self.on_muted_call.push(Box::new(handler));
        self
    }

    /// Seeds a completion pair (used by the future-wrapping layer).
    #[must_use]
    pub(crate) fn on_complete_pair(mut self, pair: CompletePair) -> Self {
        self.on_complete.push(pair);
        self
    }
}

impl fmt::Debug for RegisterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterSpec")
            .field("namespace", &self.namespace)
            .field("group", &self.group)
            .field("label", &self.label)
            .field("periodic", &self.periodic)
            .field("join", &self.join)
            .field("link_by_wrapper", &self.link_by_wrapper)
            .finish_non_exhaustive()
    }
}

impl Manager {
    /// Registers a task.
    ///
    /// Returns `None` on a locked manager: no task is created and no error
    /// is raised, which freezes new work during teardown. Otherwise:
    ///
    /// 1. the cache node for (namespace, group) is resolved, creating the
    ///    group lazily;
    /// 2. if the label is held by a live task and the spec asked for
    ///    [`Join::Wait`], the spec's completion pairs and merge handlers
    ///    attach to that task and its id is returned — nothing is created;
    /// 3. a label collision cancels the incumbent first, reason
    ///    `collision`; forwardable completion pairs migrate onto the new
    ///    task;
    /// 4. the wrapper, when present, performs the platform call with the
    ///    new task's fire token; `link_by_wrapper` adopts its return value
    ///    as the task link;
    /// 5. the task is indexed under the group node (if any), the namespace
    ///    root, and the label slot.
    pub fn register(&mut self, spec: RegisterSpec) -> Option<TaskId> {
        if self.locked {
            return None;
        }
        let mut spec = spec;
        let namespace = spec.namespace;
        self.caches.entry(namespace).or_default();

        if let Some(label) = spec.label.clone() {
            let existing = {
                let cache = &self.caches[&namespace];
                let node = match spec.group.as_deref() {
                    Some(name) => cache.group(name),
                    None => Some(&cache.root),
                };
                node.and_then(|node| node.label(&label))
            };
            if let Some(incumbent) = existing {
                let live = self
                    .tasks
                    .get(incumbent.arena())
                    .is_some_and(|task| !task.unregistered);
                if live && spec.join == Join::Wait {
                    let task = self
                        .tasks
                        .get_mut(incumbent.arena())
                        .expect("live task missing from arena");
                    task.on_complete.extend(spec.on_complete.drain(..));
                    for handler in spec.on_merge.drain(..) {
                        handler(task);
                    }
                    return Some(incumbent);
                }
                if live {
                    let mut sink: ForwardSink = Vec::new();
                    self.cancel_task(
                        incumbent,
                        CancelReason::Collision,
                        &CancelOpts::default(),
                        Some(&mut sink),
                    );
                    spec.on_complete.extend(sink);
                }
            }
        }

        let mut task = Task::new(namespace, spec.group, spec.label, spec.periodic);
        task.payload = spec.payload;
        task.destructor = spec.destructor;
        task.on_clear = spec.on_clear;
        task.on_muted_call = spec.on_muted_call;
        task.on_complete = spec.on_complete;
        let group = task.group.clone();
        let label = task.label.clone();

        let id = TaskId::from_arena(self.tasks.insert_with(|index| {
            task.id = TaskId::from_arena(index);
            task
        }));

        let mut link = None;
        if let Some(wrapper) = spec.wrapper {
            let returned = wrapper(FireToken::new(id));
            if spec.link_by_wrapper {
                link = returned;
            }
        }
        let link = link.unwrap_or_else(|| self.alloc_link());
        self.links.insert(link, id);
        if let Some(task) = self.tasks.get_mut(id.arena()) {
            task.link = Some(link);
        }

        let cache = self
            .caches
            .get_mut(&namespace)
            .expect("namespace cache created above");
        cache.root.insert(id);
        let node = match group.as_deref() {
            Some(name) => {
                let node = cache.group_mut(name);
                node.insert(id);
                node
            }
            None => &mut cache.root,
        };
        if let Some(label) = label {
            node.set_label(label, id);
        }
        Some(id)
    }

    /// Re-enters the manager when a platform primitive completes.
    ///
    /// The shim semantics, in order: unknown or unregistered ids are
    /// absorbed; a paused task queues `data` FIFO; a muted task runs its
    /// muted-call handlers and keeps a one-shot registered; a periodic task
    /// runs its payload and stays; a one-shot task is removed from every
    /// index first, then runs its payload and the success side of each
    /// completion pair. Natural completion never runs `on_clear` or the
    /// destructor.
    pub fn fire(&mut self, id: TaskId, data: FireData) -> &mut Self {
        self.fire_inner(id, data);
        self
    }

    /// [`fire`](Self::fire) with a typed value, boxed for the handlers.
    pub fn fire_with<T: 'static>(&mut self, id: TaskId, value: T) -> &mut Self {
        self.fire_inner(id, Some(Box::new(value)));
        self
    }

    pub(crate) fn fire_inner(&mut self, id: TaskId, data: FireData) {
        let Some(task) = self.tasks.get_mut(id.arena()) else {
            return;
        };
        if task.unregistered {
            return;
        }
        if task.paused {
            task.pending.push_back(data);
            return;
        }
        if task.muted {
            // Handlers cannot re-enter the manager (they only see the
            // data), so taking the list out and restoring it is safe.
            let mut handlers = core::mem::take(&mut task.on_muted_call);
            for handler in &mut handlers {
                handler(data.as_deref());
            }
            if let Some(task) = self.tasks.get_mut(id.arena()) {
                task.on_muted_call = handlers;
            }
            return;
        }
        if task.periodic {
            let Some(mut payload) = task.payload.take() else {
                return;
            };
            payload(data.as_deref());
            if let Some(task) = self.tasks.get_mut(id.arena()) {
                if task.payload.is_none() {
                    task.payload = Some(payload);
                }
            }
            return;
        }
        // One-shot: unregister before invoking.
        let Some(mut task) = self.remove_task(id) else {
            return;
        };
        if let Some(mut payload) = task.payload.take() {
            payload(data.as_deref());
        }
        for pair in &mut task.on_complete {
            (pair.on_success)(data.as_deref());
        }
    }
}
