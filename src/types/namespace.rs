//! Namespace registry.
//!
//! Every async primitive category gets its own cache partition. The
//! registry is closed: a fixed set of kinds, each with a parallel
//! "promisified" variant used only when a registration explicitly opts into
//! future semantics. Promisified namespaces have no independent teardown;
//! manager-wide sweeps tear them down through their backing kind.

use core::fmt;

/// Category of async primitive a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NamespaceKind {
    /// One-shot timers.
    Timeout,
    /// Periodic timers.
    Interval,
    /// Run-as-soon-as-possible callbacks.
    Immediate,
    /// Host idle-period callbacks.
    IdleCallback,
    /// Host animation-frame callbacks.
    AnimationFrame,
    /// Event-emitter listeners.
    EventListener,
    /// Background workers.
    Worker,
    /// Plain proxied functions and wrapped futures.
    Proxy,
    /// Iterable consumption.
    Iterable,
    /// Outbound requests.
    Request,
}

impl NamespaceKind {
    /// All kinds, in cache-partition order.
    pub const ALL: [NamespaceKind; 10] = [
        NamespaceKind::Timeout,
        NamespaceKind::Interval,
        NamespaceKind::Immediate,
        NamespaceKind::IdleCallback,
        NamespaceKind::AnimationFrame,
        NamespaceKind::EventListener,
        NamespaceKind::Worker,
        NamespaceKind::Proxy,
        NamespaceKind::Iterable,
        NamespaceKind::Request,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NamespaceKind::Timeout => "timeout",
            NamespaceKind::Interval => "interval",
            NamespaceKind::Immediate => "immediate",
            NamespaceKind::IdleCallback => "idle-callback",
            NamespaceKind::AnimationFrame => "animation-frame",
            NamespaceKind::EventListener => "event-listener",
            NamespaceKind::Worker => "worker",
            NamespaceKind::Proxy => "proxy",
            NamespaceKind::Iterable => "iterable",
            NamespaceKind::Request => "request",
        }
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cache partition: a kind plus the promisified flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    kind: NamespaceKind,
    promisified: bool,
}

impl Namespace {
    /// The plain namespace for `kind`.
    #[inline]
    #[must_use]
    pub const fn new(kind: NamespaceKind) -> Self {
        Self {
            kind,
            promisified: false,
        }
    }

    /// The promisified namespace for `kind`.
    #[inline]
    #[must_use]
    pub const fn promisified(kind: NamespaceKind) -> Self {
        Self {
            kind,
            promisified: true,
        }
    }

    /// The backing kind.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> NamespaceKind {
        self.kind
    }

    /// Whether this is the promisified variant.
    #[inline]
    #[must_use]
    pub const fn is_promisified(self) -> bool {
        self.promisified
    }
}

impl From<NamespaceKind> for Namespace {
    fn from(kind: NamespaceKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.promisified {
            write!(f, "{}:promise", self.kind.name())
        } else {
            f.write_str(self.kind.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promisified_is_a_distinct_partition() {
        let plain = Namespace::new(NamespaceKind::Timeout);
        let promise = Namespace::promisified(NamespaceKind::Timeout);
        assert_ne!(plain, promise);
        assert_eq!(plain.kind(), promise.kind());
        assert!(!plain.is_promisified());
        assert!(promise.is_promisified());
    }

    #[test]
    fn display_names() {
        assert_eq!(Namespace::new(NamespaceKind::Proxy).to_string(), "proxy");
        assert_eq!(
            Namespace::promisified(NamespaceKind::Proxy).to_string(),
            "proxy:promise"
        );
        assert_eq!(
            Namespace::new(NamespaceKind::IdleCallback).to_string(),
            "idle-callback"
        );
    }

    #[test]
    fn all_kinds_have_unique_names() {
        let mut names: Vec<_> = NamespaceKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), NamespaceKind::ALL.len());
    }
}
