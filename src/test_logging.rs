//! Test logging infrastructure.
//!
//! Captures typed manager events with timestamps so integration tests can
//! dump a readable timeline on failure. Tests log what they drive
//! (registrations, fires, cancels); nothing in the manager itself depends
//! on this module.
//!
//! ```ignore
//! let logger = TestLogger::new(TestLogLevel::Debug);
//! logger.log(TestEvent::Register { namespace: "timeout", id: "0:0" });
//! println!("{}", logger.report());
//! ```

use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::Instant;

/// Logging verbosity for tests, least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TestLogLevel {
    /// Only failures.
    Error,
    /// General progress.
    #[default]
    Info,
    /// Every event, including absorbed no-ops.
    Debug,
}

/// Typed events for manager operations under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestEvent {
    /// A task was registered.
    Register {
        /// Namespace display name.
        namespace: String,
        /// Task id display form.
        id: String,
    },
    /// A task (or sweep target) was cancelled.
    Cancel {
        /// Task id display form.
        id: String,
        /// Cancellation reason name.
        reason: &'static str,
    },
    /// A marker was applied.
    Mark {
        /// Task id display form.
        id: String,
        /// Marker display form.
        marker: String,
    },
    /// The platform fired a task.
    Fire {
        /// Task id display form.
        id: String,
    },
    /// A wrapped future settled.
    Settle {
        /// True for resolution, false for rejection.
        resolved: bool,
    },
    /// Free-form test phase boundary.
    Phase {
        /// Phase name.
        name: String,
    },
}

impl TestEvent {
    fn level(&self) -> TestLogLevel {
        match self {
            TestEvent::Phase { .. } => TestLogLevel::Error,
            TestEvent::Fire { .. } => TestLogLevel::Debug,
            _ => TestLogLevel::Info,
        }
    }
}

/// Captures events with elapsed-time stamps.
#[derive(Debug)]
pub struct TestLogger {
    level: TestLogLevel,
    start: Instant,
    events: Mutex<Vec<(u128, TestEvent)>>,
}

impl TestLogger {
    /// Creates a logger keeping events at or below `level`.
    #[must_use]
    pub fn new(level: TestLogLevel) -> Self {
        Self {
            level,
            start: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Records an event if its level is enabled.
    pub fn log(&self, event: TestEvent) {
        if event.level() > self.level {
            return;
        }
        let elapsed = self.start.elapsed().as_micros();
        self.events
            .lock()
            .expect("test logger poisoned")
            .push((elapsed, event));
    }

    /// Number of captured events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().expect("test logger poisoned").len()
    }

    /// True if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the captured timeline.
    #[must_use]
    pub fn report(&self) -> String {
        let events = self.events.lock().expect("test logger poisoned");
        let mut out = String::new();
        let _ = writeln!(out, "--- test log ({} events) ---", events.len());
        for (elapsed, event) in events.iter() {
            let _ = writeln!(out, "[{elapsed:>8}us] {event:?}");
        }
        out
    }
}
