//! Convenience builders: thin namespace-specific adapters over the core.
//!
//! Builders supply the wrapper that performs the real platform call and the
//! destructor that undoes it; everything else is the register/cancel/mark
//! engine. Platform capabilities are resolved once at registration time
//! through explicit traits and adapters, never re-probed per call.

pub mod events;
pub mod timer;

pub use events::{listen, listen_once, EmitterAdapter};
pub use timer::{
    request_animation_frame, request_idle_callback, set_immediate, set_interval, set_timeout,
    TimerHost,
};

use crate::manager::Join;

/// Shared registration options for the builders.
#[derive(Debug, Clone, Default)]
pub struct BuilderOpts {
    /// Optional group for bulk operations.
    pub group: Option<String>,
    /// Optional label (at most one live task per label per cache node).
    pub label: Option<String>,
    /// Label-collision policy.
    pub join: Join,
}

impl BuilderOpts {
    /// Sets the group.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the join policy.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }
}
