//! Selectors and the cancel algorithm.

use crate::manager::cache::{GroupMatch, GroupPattern};
use crate::manager::task::{ClearContext, ForwardSink};
use crate::manager::{Manager, MAX_FORWARD_DEPTH};
use crate::types::{CancelReason, Cancellation, Namespace, TaskId};

/// Structured filter: any combination of id, group, and label.
///
/// An empty filter selects everything in the namespace.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Target a single task by id.
    pub id: Option<TaskId>,
    /// Restrict to one group (exact) or broadcast over groups (pattern).
    pub group: Option<GroupMatch>,
    /// Target the task currently holding this label.
    pub label: Option<String>,
    /// Override the reason reported to `on_clear` handlers.
    pub reason: Option<CancelReason>,
}

impl TaskFilter {
    /// Restricts the filter to a task id.
    #[must_use]
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    /// Restricts the filter to an exact group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(GroupMatch::Exact(group.into()));
        self
    }

    /// Broadcasts the filter over every group matching a `*`-glob.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.group = Some(GroupMatch::Pattern(GroupPattern::new(pattern)));
        self
    }

    /// Restricts the filter to a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Overrides the reported cancellation reason.
    #[must_use]
    pub fn with_reason(mut self, reason: CancelReason) -> Self {
        self.reason = Some(reason);
        self
    }
}

/// What a cancel or mark operation targets.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Everything in the namespace (reason `all`).
    All,
    /// A single task by id.
    Id(TaskId),
    /// A structured filter.
    Filter(TaskFilter),
}

impl Selector {
    /// Selects a single task by id.
    #[must_use]
    pub fn id(id: TaskId) -> Self {
        Selector::Id(id)
    }

    /// Selects the task holding `label` at the namespace root.
    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Selector::Filter(TaskFilter::default().with_label(label))
    }

    /// Selects every task in an exact group.
    #[must_use]
    pub fn group(group: impl Into<String>) -> Self {
        Selector::Filter(TaskFilter::default().with_group(group))
    }

    /// Selects every task in every group matching a `*`-glob.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Selector::Filter(TaskFilter::default().with_pattern(pattern))
    }
}

impl From<TaskId> for Selector {
    fn from(id: TaskId) -> Self {
        Selector::Id(id)
    }
}

impl From<TaskFilter> for Selector {
    fn from(filter: TaskFilter) -> Self {
        Selector::Filter(filter)
    }
}

/// Options for a cancel operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelOpts {
    /// Skip the task's destructor (the platform teardown) after the
    /// `on_clear` handlers have run.
    pub suppress_destructor: bool,
}

impl Manager {
    /// Cancels whatever `selector` resolves to in `namespace`.
    ///
    /// An unresolvable selector — unknown or cross-namespace id, empty
    /// group, vacated label, or a label whose current id no longer matches
    /// an id filter — is a
    /// no-op, which makes double cancellation and cancellation races safe
    /// by construction. A bare group or namespace selector cancels every
    /// indexed task in insertion order. Tasks in a zombie group survive a
    /// reason-`all` sweep but not an explicit target.
    pub fn cancel(&mut self, selector: Selector, namespace: Namespace) -> &mut Self {
        self.cancel_with(selector, namespace, CancelOpts::default())
    }

    /// [`cancel`](Self::cancel) with explicit options.
    pub fn cancel_with(
        &mut self,
        selector: Selector,
        namespace: Namespace,
        opts: CancelOpts,
    ) -> &mut Self {
        for (id, reason) in self.resolve_selector(&selector, namespace) {
            self.cancel_task(id, reason, &opts, None);
        }
        self
    }

    fn id_in_namespace(&self, id: TaskId, namespace: Namespace) -> bool {
        self.tasks
            .get(id.arena())
            .is_some_and(|task| task.namespace == namespace)
    }

    /// Resolves a selector to `(id, reason)` targets.
    ///
    /// Resolution order: group (patterns broadcast over existing groups) →
    /// label within the node → id. A label with a mismatching id filter
    /// resolves to nothing rather than erroring; call sites rely on that
    /// for idempotent re-cancellation. An id belonging to a different
    /// namespace is likewise absorbed: namespaces are independent caches
    /// and never reach across.
    pub(crate) fn resolve_selector(
        &self,
        selector: &Selector,
        namespace: Namespace,
    ) -> Vec<(TaskId, CancelReason)> {
        let Some(cache) = self.caches.get(&namespace) else {
            return Vec::new();
        };
        match selector {
            Selector::All => cache
                .root
                .ids()
                .into_iter()
                .map(|id| (id, CancelReason::All))
                .collect(),
            Selector::Id(id) => {
                if self.id_in_namespace(*id, namespace) {
                    vec![(*id, CancelReason::Id)]
                } else {
                    Vec::new()
                }
            }
            Selector::Filter(filter) => {
                if let Some(GroupMatch::Pattern(pattern)) = &filter.group {
                    let mut targets = Vec::new();
                    for name in cache.matching_groups(pattern) {
                        let exact = TaskFilter {
                            id: filter.id,
                            group: Some(GroupMatch::Exact(name)),
                            label: filter.label.clone(),
                            reason: Some(
                                filter.reason.unwrap_or(CancelReason::Pattern),
                            ),
                        };
                        targets.extend(
                            self.resolve_selector(&Selector::Filter(exact), namespace),
                        );
                    }
                    return targets;
                }

                let (node, grouped) = match &filter.group {
                    Some(GroupMatch::Exact(name)) => match cache.group(name) {
                        Some(node) => (node, true),
                        None => return Vec::new(),
                    },
                    Some(GroupMatch::Pattern(_)) => unreachable!("handled above"),
                    None => (&cache.root, false),
                };

                if let Some(label) = &filter.label {
                    let Some(current) = node.label(label) else {
                        return Vec::new();
                    };
                    // Lenient id filter: a mismatch means the labelled task
                    // was replaced since the caller took its id.
                    if filter.id.is_some_and(|id| id != current) {
                        return Vec::new();
                    }
                    let reason = filter.reason.unwrap_or(CancelReason::Label);
                    return vec![(current, reason)];
                }
                if let Some(id) = filter.id {
                    if !self.id_in_namespace(id, namespace) {
                        return Vec::new();
                    }
                    return vec![(id, filter.reason.unwrap_or(CancelReason::Id))];
                }
                let reason = filter.reason.unwrap_or(if grouped {
                    CancelReason::Group
                } else {
                    CancelReason::All
                });
                node.ids().into_iter().map(|id| (id, reason)).collect()
            }
        }
    }

    /// Cancels one task: terminal unregister, index removal, `on_clear`
    /// handlers, destructor, then completion-pair failure delivery.
    ///
    /// On a collision with a forward sink, forwardable completion pairs
    /// within the depth bound migrate into the sink instead of failing.
    pub(crate) fn cancel_task(
        &mut self,
        id: TaskId,
        reason: CancelReason,
        opts: &CancelOpts,
        mut sink: Option<&mut ForwardSink>,
    ) {
        if reason == CancelReason::All {
            let zombie = self
                .tasks
                .get(id.arena())
                .and_then(|task| task.group.as_deref())
                .is_some_and(crate::manager::is_zombie_group);
            if zombie {
                return;
            }
        }
        let Some(mut task) = self.remove_task(id) else {
            return;
        };
        let cancellation = Cancellation {
            reason,
            link: task.link,
        };
        let mut handlers = core::mem::take(&mut task.on_clear);
        {
            let ctx = ClearContext {
                id,
                link: task.link,
                label: task.label.as_deref(),
                group: task.group.as_deref(),
                reason,
            };
            for handler in &mut handlers {
                handler(&ctx);
            }
        }
        if !opts.suppress_destructor {
            if let (Some(mut destructor), Some(link)) = (task.destructor.take(), task.link) {
                destructor(link);
            }
        }
        for mut pair in task.on_complete.drain(..) {
            let forward = reason == CancelReason::Collision
                && pair.forwardable
                && pair.depth < MAX_FORWARD_DEPTH;
            match (forward, sink.as_deref_mut()) {
                (true, Some(sink)) => {
                    pair.depth += 1;
                    sink.push(pair);
                }
                _ => (pair.on_failure)(&cancellation),
            }
        }
    }
}
