//! # Error Types
//!
//! Foundational errors shared by every crate in the workspace. Layer-specific
//! errors (configuration, lookup, transition, validation) live next to the
//! state machine in `lifecycle-state` and convert into [`LifecycleError`]
//! at the application boundary.

use thiserror::Error;

/// Top-level error type for the lifecycle stack.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A status or event name failed validation.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected input.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A timestamp could not be parsed or constructed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// State machine configuration was rejected.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A status or event lookup failed.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// A transition was rejected.
    #[error("transition rejected: {0}")]
    Transition(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
