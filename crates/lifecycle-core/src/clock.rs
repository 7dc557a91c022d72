//! # Clock Abstraction
//!
//! Side-effect hooks that stamp timestamps read the time through a
//! [`Clock`] owned by the state machine. Production code injects
//! [`SystemClock`]; tests inject [`FixedClock`] for deterministic output.

use std::fmt;

use crate::temporal::Timestamp;

/// Source of the current time for transition side effects.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current UTC time, truncated to seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
