//! # Escalation Lifecycle
//!
//! The incident escalation state machine: an alert or incident is
//! triggered, acknowledged by a responder, and eventually resolved or
//! ignored. It can be re-triggered from anywhere.
//!
//! ## States
//!
//! ```text
//!            ┌──────────── trigger (any) ────────────┐
//!            ▼                                        │
//!       Triggered ──acknowledge──▶ Acknowledged       │
//!            │                         │              │
//!            ├──resolve──▶ Resolved ◀──┘              │
//!            └──ignore───▶ Ignored ───────────────────┘
//! ```
//!
//! Every event is `any`-sourced, so the machine is fully cyclic and each
//! event is also a self-transition.
//!
//! ## Field invariants
//!
//! - `resolved` requires `resolved_at`.
//! - `triggered`, `acknowledged` and `ignored` forbid it.
//!
//! Hooks keep them true: entering `resolved` stamps `resolved_at` with the
//! first timestamp argument, or the clock's now; entering anything else
//! clears it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lifecycle_core::{Clock, EventName, Timestamp};

use crate::entity::Entity;
use crate::error::ConfigError;
use crate::hook::HookContext;
use crate::machine::{Select, StateMachine, ANY};
use crate::status::StatusValue;

/// The bundled YAML form of the escalation machine.
pub const ESCALATION_DEFINITION: &str = include_str!("../definitions/escalation.yaml");

// ─── Escalation Status ───────────────────────────────────────────────

/// The status of an escalatable entity, with its persisted ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum EscalationStatus {
    /// Raised and awaiting a responder.
    Triggered = 0,
    /// A responder is working on it.
    Acknowledged = 1,
    /// Closed after being handled.
    Resolved = 2,
    /// Closed without action.
    Ignored = 3,
}

impl EscalationStatus {
    /// Every status, in ordinal order.
    pub const ALL: [Self; 4] = [Self::Triggered, Self::Acknowledged, Self::Resolved, Self::Ignored];

    /// Statuses that still need attention.
    pub const OPEN: [Self; 2] = [Self::Triggered, Self::Acknowledged];

    /// The canonical status name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }

    /// The persisted ordinal.
    pub fn ordinal(&self) -> i32 {
        *self as i32
    }

    /// The event that moves an entity into this status.
    pub fn event(&self) -> &'static str {
        match self {
            Self::Triggered => "trigger",
            Self::Acknowledged => "acknowledge",
            Self::Resolved => "resolve",
            Self::Ignored => "ignore",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Triggered => "Triggered",
            Self::Acknowledged => "Acknowledged",
            Self::Resolved => "Resolved",
            Self::Ignored => "Ignored",
        }
    }

    /// Whether the entity still needs attention.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Triggered | Self::Acknowledged)
    }

    /// Look up by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Look up by persisted ordinal.
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.ordinal() == ordinal)
    }

    /// Map a registered status value back to the enum.
    pub fn from_status(status: &StatusValue) -> Option<Self> {
        Self::from_ordinal(status.ordinal()).filter(|s| s.name() == status.name().as_str())
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ─── Escalation Fields ───────────────────────────────────────────────

/// Auxiliary fields whose validity depends on the escalation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EscalationFields {
    /// When the entity was resolved. Present only while `resolved`.
    pub resolved_at: Option<Timestamp>,
}

/// An entity under the escalation lifecycle.
pub type Escalation = Entity<EscalationFields>;

impl Escalation {
    /// The current status as an [`EscalationStatus`].
    pub fn escalation_status(&self) -> Option<EscalationStatus> {
        EscalationStatus::from_status(self.status())
    }

    /// Whether the entity still needs attention.
    pub fn is_open(&self) -> bool {
        self.escalation_status().is_some_and(|s| s.is_open())
    }

    /// When the entity was resolved, if it currently is.
    pub fn resolved_at(&self) -> Option<Timestamp> {
        self.fields().resolved_at
    }
}

// ─── Machine ─────────────────────────────────────────────────────────

/// Build the escalation machine reading time from `clock`.
///
/// The machine is returned unsealed so hosts can layer extra hooks or
/// invariants; the first `fire()` seals it.
pub fn escalation_machine(clock: Arc<dyn Clock>) -> Result<StateMachine<EscalationFields>, ConfigError> {
    let mut machine = StateMachine::with_clock("escalation", clock);

    for status in EscalationStatus::ALL {
        machine.register_status(status.name(), status.ordinal())?;
    }
    machine.set_initial_status(EscalationStatus::Triggered.name())?;

    for status in EscalationStatus::ALL {
        machine.define_transition(status.event(), ANY, status.name())?;
    }

    let resolved = EscalationStatus::Resolved.name();
    machine.before_transition(
        Select::except([resolved]),
        |fields: &mut EscalationFields, _: &HookContext<'_>| {
            fields.resolved_at = None;
        },
    )?;
    machine.before_transition(
        resolved,
        |fields: &mut EscalationFields, ctx: &HookContext<'_>| {
            fields.resolved_at = Some(ctx.timestamp_arg_or_now());
        },
    )?;

    machine.register_invariant(
        resolved,
        |fields: &EscalationFields| fields.resolved_at.is_some(),
        "resolved_at must be present",
    )?;
    for status in EscalationStatus::ALL.into_iter().filter(|s| *s != EscalationStatus::Resolved) {
        machine.register_invariant(
            status.name(),
            |fields: &EscalationFields| fields.resolved_at.is_none(),
            "resolved_at must be absent",
        )?;
    }

    Ok(machine)
}

impl StateMachine<EscalationFields> {
    /// The event that moves an entity from `from` to `to` in one hop.
    pub fn status_event_for(&self, from: EscalationStatus, to: EscalationStatus) -> Option<&EventName> {
        let from = self.status_by_ordinal(from.ordinal()).ok()?;
        let to = self.status_by_ordinal(to.ordinal()).ok()?;
        self.event_for(from, to)
    }
}
