//! Core types for the manager.
//!
//! - [`id`]: identifier types (`TaskId`, `RawLink`, `FireToken`)
//! - [`namespace`]: the closed namespace registry
//! - [`cancel`]: cancellation reasons, markers, rejection descriptor

pub mod cancel;
pub mod id;
pub mod namespace;

pub use cancel::{CancelReason, Cancellation, Marker};
pub use id::{FireToken, RawLink, TaskId};
pub use namespace::{Namespace, NamespaceKind};
