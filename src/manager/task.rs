//! The task record: one registered unit of async work.

use crate::types::{CancelReason, Namespace, RawLink, TaskId};
use core::fmt;
use smallvec::SmallVec;
use std::any::Any;
use std::collections::VecDeque;

/// Data passed through a fire into the task's payload and handlers.
///
/// Owned on the way in; handlers observe it by shared reference so one fire
/// can feed the payload and every joined completion handler.
pub type FireData = Option<Box<dyn Any>>;

/// The task's own work: invoked on each fire (periodic) or on the single
/// fire (one-shot).
pub type Payload = Box<dyn FnMut(Option<&dyn Any>)>;

/// Runs exactly once when the task is cancelled.
pub type ClearHandler = Box<dyn FnMut(&ClearContext<'_>)>;

/// Runs instead of the payload when a muted task fires.
pub type MutedHandler = Box<dyn FnMut(Option<&dyn Any>)>;

/// Runs against the in-flight task when a join-by-wait registration attaches.
pub type MergeHandler = Box<dyn FnOnce(&mut Task)>;

/// Platform teardown: disarm a timer, remove a listener, terminate a worker.
/// Must be idempotent-safe for the link it receives.
pub type Destructor = Box<dyn FnMut(RawLink)>;

/// Performs the real platform call at registration time (arm a timer,
/// attach a listener). Its return value becomes the task link when the
/// registration asked for `link_by_wrapper`.
pub type Wrapper = Box<dyn FnOnce(crate::types::FireToken) -> Option<RawLink>>;

/// A (success, failure) completion handler pair.
///
/// Appended when another registration joins this task; the success side runs
/// on natural one-shot completion, the failure side on cancellation. Pairs
/// marked `forwardable` migrate onto the replacement task on a label
/// collision instead of failing, up to the forwarding depth bound.
pub struct CompletePair {
    pub(crate) on_success: Box<dyn FnMut(Option<&dyn Any>)>,
    pub(crate) on_failure: Box<dyn FnMut(&crate::types::Cancellation)>,
    pub(crate) forwardable: bool,
    pub(crate) depth: u32,
}

/// Completion pairs rescued from a collided task, waiting to be attached
/// to its replacement.
pub(crate) type ForwardSink = Vec<CompletePair>;

impl fmt::Debug for CompletePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletePair")
            .field("forwardable", &self.forwardable)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// Context handed to every `on_clear` handler of a cancelled task.
#[derive(Debug)]
pub struct ClearContext<'a> {
    /// Identity of the cancelled task.
    pub id: TaskId,
    /// Platform link, when one was assigned.
    pub link: Option<RawLink>,
    /// Label the task was registered under.
    pub label: Option<&'a str>,
    /// Group the task was registered under.
    pub group: Option<&'a str>,
    /// Why the task was cancelled.
    pub reason: CancelReason,
}

/// Bookkeeping record for one registered operation.
///
/// Owned exclusively by the manager's arena; reachable from the namespace
/// root index, from its group index when grouped, and from a label slot
/// when labelled. `unregistered` is terminal: a task never comes back.
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) link: Option<RawLink>,
    pub(crate) namespace: Namespace,
    pub(crate) group: Option<String>,
    pub(crate) label: Option<String>,
    pub(crate) periodic: bool,
    pub(crate) paused: bool,
    pub(crate) muted: bool,
    pub(crate) unregistered: bool,
    /// Deferred fire data, populated only while paused. Strict FIFO.
    pub(crate) pending: VecDeque<FireData>,
    pub(crate) payload: Option<Payload>,
    pub(crate) on_complete: SmallVec<[CompletePair; 1]>,
    pub(crate) on_clear: SmallVec<[ClearHandler; 1]>,
    pub(crate) on_muted_call: SmallVec<[MutedHandler; 1]>,
    pub(crate) destructor: Option<Destructor>,
}

impl Task {
    pub(crate) fn new(
        namespace: Namespace,
        group: Option<String>,
        label: Option<String>,
        periodic: bool,
    ) -> Self {
        Self {
            id: TaskId::new_for_test(0, 0),
            link: None,
            namespace,
            group,
            label,
            periodic,
            paused: false,
            muted: false,
            unregistered: false,
            pending: VecDeque::new(),
            payload: None,
            on_complete: SmallVec::new(),
            on_clear: SmallVec::new(),
            on_muted_call: SmallVec::new(),
            destructor: None,
        }
    }

    /// The task's id.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task's platform link, when assigned.
    #[must_use]
    pub fn link(&self) -> Option<RawLink> {
        self.link
    }

    /// The namespace this task is registered in.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The task's group, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The task's label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether the task re-fires on every platform callback.
    #[must_use]
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Whether the task is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the task is currently muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Attaches a completion pair (used by joining registrations).
    pub fn push_complete(&mut self, pair: CompletePair) {
        self.on_complete.push(pair);
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("group", &self.group)
            .field("label", &self.label)
            .field("periodic", &self.periodic)
            .field("paused", &self.paused)
            .field("muted", &self.muted)
            .field("unregistered", &self.unregistered)
            .field("pending", &self.pending.len())
            .field("on_complete", &self.on_complete.len())
            .field("on_clear", &self.on_clear.len())
            .finish_non_exhaustive()
    }
}
