//! Cancellation reasons, state markers, and the rejection descriptor.

use crate::types::RawLink;
use core::fmt;

/// Why a task was cancelled.
///
/// Carried into every `on_clear` handler and into the rejection descriptor
/// of a wrapped future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// Targeted by id.
    Id,
    /// Targeted by label.
    Label,
    /// Targeted by exact group name.
    Group,
    /// Targeted by a group pattern broadcast.
    Pattern,
    /// Displaced by a later registration under the same label.
    Collision,
    /// Swept by a namespace-wide or manager-wide "cancel everything".
    All,
    /// Settled while muted with no muted-resolve handler configured.
    Muting,
    /// The settlement fire carried no value of the expected type.
    Mismatch,
}

impl CancelReason {
    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CancelReason::Id => "id",
            CancelReason::Label => "label",
            CancelReason::Group => "group",
            CancelReason::Pattern => "rgxp",
            CancelReason::Collision => "collision",
            CancelReason::All => "all",
            CancelReason::Muting => "muting",
            CancelReason::Mismatch => "mismatch",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State toggle applied by [`Manager::mark`](crate::Manager::mark).
///
/// `Unpaused` is special: it flushes the pending-invocation queue in FIFO
/// order and clears `muted` as well, since pausing defers work rather than
/// dropping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Suppress handler delivery without stopping the underlying operation.
    Muted,
    /// Clear the muted flag.
    Unmuted,
    /// Defer invocation delivery into the pending queue.
    Paused,
    /// Resume: flush the pending queue FIFO and also unmute.
    Unpaused,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Marker::Muted => "muted",
            Marker::Unmuted => "!muted",
            Marker::Paused => "paused",
            Marker::Unpaused => "!paused",
        };
        f.write_str(name)
    }
}

/// Structured rejection descriptor for cancelled futures.
///
/// Futures always fail through this one channel: cancellation is a value,
/// never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancellation {
    /// Why the underlying task went away.
    pub reason: CancelReason,
    /// Platform link of the cancelled task, when one was assigned.
    pub link: Option<RawLink>,
}

impl fmt::Display for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cancelled (reason: {})", self.reason)
    }
}

impl std::error::Error for Cancellation {}
