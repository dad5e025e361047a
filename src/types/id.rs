//! Identifier types.

use crate::util::ArenaIndex;
use core::fmt;

/// Identity of a registered task.
///
/// Internally an arena index with a generation counter: once the task is
/// removed, every outstanding copy of its id goes stale and resolves to
/// nothing. Ids are cheap to copy and never dangle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(ArenaIndex);

impl TaskId {
    #[inline]
    pub(crate) const fn from_arena(index: ArenaIndex) -> Self {
        Self(index)
    }

    #[inline]
    pub(crate) const fn arena(self) -> ArenaIndex {
        self.0
    }

    /// Builds an id from raw parts (test helper).
    #[must_use]
    pub const fn new_for_test(slot: u32, generation: u32) -> Self {
        Self(ArenaIndex::new(slot, generation))
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({}:{})", self.0.slot(), self.0.generation())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.slot(), self.0.generation())
    }
}

/// Opaque platform-side handle for a task.
///
/// Either whatever the arm wrapper returned (a timer handle, a listener
/// token) or a manager-allocated value when the wrapper returned nothing.
/// The manager keeps a plain, non-owning `link -> task` lookup table; a link
/// held by the host never keeps a task alive.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawLink(
    /// Raw handle value.
    pub u64,
);

impl fmt::Debug for RawLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawLink({})", self.0)
    }
}

/// Capability handed to arm wrappers at registration time.
///
/// The platform stores the token and later re-enters the manager with
/// [`Manager::fire`](crate::Manager::fire) when the primitive completes.
/// A token alone cannot mutate the manager, so arming can never re-enter
/// the registration that is still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireToken {
    task: TaskId,
}

impl FireToken {
    #[inline]
    pub(crate) const fn new(task: TaskId) -> Self {
        Self { task }
    }

    /// The task this token fires.
    #[inline]
    #[must_use]
    pub const fn task(self) -> TaskId {
        self.task
    }
}
