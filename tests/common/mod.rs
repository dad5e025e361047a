//! Shared helpers for integration tests.

#![allow(dead_code)]

use quash::test_logging::{TestLogLevel, TestLogger};
use std::sync::OnceLock;

static LOGGER: OnceLock<TestLogger> = OnceLock::new();

/// Global test logger, created on first use.
pub fn logger() -> &'static TestLogger {
    LOGGER.get_or_init(|| {
        let level = match std::env::var("QUASH_TEST_LOG").as_deref() {
            Ok("debug") => TestLogLevel::Debug,
            Ok("error") => TestLogLevel::Error,
            _ => TestLogLevel::Info,
        };
        TestLogger::new(level)
    })
}

/// Marks a test phase boundary in the global log.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        common::logger().log(quash::test_logging::TestEvent::Phase {
            name: ($name).to_owned(),
        });
    };
}
