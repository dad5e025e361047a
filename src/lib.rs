//! Asynchronous task lifecycle and cancellation management.
//!
//! `quash` lets a caller register heterogeneous async primitives — timers,
//! event listeners, workers, futures, proxied functions — under one model,
//! and later cancel, mute, or pause any single task or any structured
//! collection of tasks (by group, by label, by pattern, or all of them)
//! without remembering which primitive created what.
//!
//! The crate manages bookkeeping and cancellation semantics only: the
//! actual timers and I/O live in the host environment, reached through
//! opaque arm/disarm capabilities supplied at registration time.
//!
//! # Model
//!
//! - **Namespace**: a fixed category partitioning independent caches
//!   ([`NamespaceKind`] plus a promisified variant of each).
//! - **Group**: a caller-chosen bucket within a namespace for bulk
//!   operations, targetable by exact name or `*`-glob pattern.
//! - **Label**: a caller-chosen key, unique within one cache node; a new
//!   registration under an occupied label displaces the incumbent
//!   (reason `collision`) or joins it, per [`Join`] policy.
//! - **Task**: the bookkeeping record for one registered unit of work,
//!   with `paused`/`muted` flags and a terminal `unregistered` state.
//!
//! ```ignore
//! use quash::{Join, Manager, Namespace, NamespaceKind, RegisterSpec, Selector};
//!
//! let mut manager = Manager::new();
//! let ns = Namespace::new(NamespaceKind::Timeout);
//!
//! let id = manager
//!     .register(
//!         RegisterSpec::new(ns)
//!             .group("ui")
//!             .label("spinner")
//!             .payload(|_| println!("tick")),
//!     )
//!     .unwrap();
//!
//! manager.fire(id, None);              // host re-entry: runs the payload
//! manager.cancel(Selector::group("ui"), ns);
//! ```
//!
//! Cancellation is synchronous and immediate: by the time `cancel`
//! returns, the task is unreachable from every index and its destructor
//! has run. Double cancellation and cancel-after-complete are defined
//! no-ops. Wrapped futures ([`wrap_future`]) reject with a structured
//! [`Cancellation`] descriptor, never a panic.

pub mod builders;
pub mod error;
pub mod future;
pub mod manager;
pub mod test_logging;
pub mod types;
pub mod util;
pub mod worker;

pub use error::{Error, ErrorKind};
pub use future::{wrap_future, FutureSpec, TaskFuture};
pub use manager::{
    CancelOpts, ClearContext, GroupMatch, GroupPattern, Join, Manager, NamespaceOps, RegisterSpec,
    Selector, Task, TaskFilter, MAX_FORWARD_DEPTH, ZOMBIE_MARKER,
};
pub use types::{
    CancelReason, Cancellation, FireToken, Marker, Namespace, NamespaceKind, RawLink, TaskId,
};
pub use worker::WorkerHandle;
