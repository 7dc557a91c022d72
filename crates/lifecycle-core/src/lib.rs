//! # lifecycle-core — Foundational Types for the Lifecycle Stack
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! state machine is built from; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Validated names.** `StatusName` and `EventName` are newtypes with
//!    validated constructors. No bare strings flow into transition tables.
//!
//! 2. **UTC-only timestamps.** `Timestamp` is always UTC, truncated to
//!    seconds, and renders as `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! 3. **Injected time.** Side-effect hooks read the time through a
//!    [`Clock`], so a transition is a deterministic function of its inputs
//!    under test.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lifecycle-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod clock;
pub mod error;
pub mod identity;
pub mod temporal;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::LifecycleError;
pub use identity::{EntityId, EventName, StatusName};
pub use temporal::Timestamp;
