//! Error types and error handling strategy.
//!
//! The manager absorbs expected races as no-ops rather than surfacing them:
//! cancelling an already-cancelled task, marking a missing group, or
//! registering on a locked manager are all defined non-errors. What remains
//! is genuine misuse, raised synchronously by the convenience builders:
//!
//! - **MissingCapability**: a builder was handed an adapter that cannot
//!   attach, detach, or destroy the primitive it wraps. Programmer error,
//!   never swallowed.
//! - **InvalidTarget**: a structured selector shape that cannot hold the
//!   requested operation. Reserved for sibling subsystems that reuse this
//!   taxonomy.
//!
//! Cancellation of a future never goes through this module; it propagates
//! as a rejection carrying [`Cancellation`](crate::types::Cancellation).

use core::fmt;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No recognized attach/detach/destroy capability on the given object.
    MissingCapability,
    /// Selector shape cannot structurally hold the requested operation.
    InvalidTarget,
}

impl ErrorKind {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::MissingCapability => "missing-capability",
            ErrorKind::InvalidTarget => "invalid-target",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error raised by a convenience builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    context: &'static str,
}

impl Error {
    /// Creates an error with the given kind and context.
    #[must_use]
    pub const fn new(kind: ErrorKind, context: &'static str) -> Self {
        Self { kind, context }
    }

    /// Shorthand for a [`ErrorKind::MissingCapability`] error.
    #[must_use]
    pub const fn missing_capability(context: &'static str) -> Self {
        Self::new(ErrorKind::MissingCapability, context)
    }

    /// Shorthand for an [`ErrorKind::InvalidTarget`] error.
    #[must_use]
    pub const fn invalid_target(context: &'static str) -> Self {
        Self::new(ErrorKind::InvalidTarget, context)
    }

    /// The error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Static description of what went wrong.
    #[must_use]
    pub const fn context(&self) -> &'static str {
        self.context
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}
