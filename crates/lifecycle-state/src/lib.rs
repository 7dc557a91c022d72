//! # lifecycle-state — Guarded Status State Machines
//!
//! A finite-state transition system with guarded, validated, side-effecting
//! moves, usable for any entity that travels through named statuses
//! (incidents, alerts, builds, pipelines).
//!
//! ## Components
//!
//! - **Status registry** ([`status`]): named statuses with stable ordinals.
//! - **Transition table** ([`transition`]): `(event, from) → to` rules with
//!   conflict detection at definition time.
//! - **Guard layer** ([`guard`]): per-status invariants over auxiliary fields.
//! - **Side-effect hooks** ([`hook`]): field updates run before validation.
//! - **Transition engine** ([`machine`]): `fire()` resolves, runs hooks on a
//!   working copy, validates, and commits atomically.
//! - **Definitions** ([`definition`]): the same machines described in YAML.
//! - **Escalation** ([`escalation`]): the incident escalation lifecycle.
//!
//! ## Design
//!
//! Rules are data, not behavior mixed into entity types. An entity type is
//! governed by whichever `StateMachine` the composition root hands it, and
//! the machine is frozen once in use:
//!
//! ```text
//! let machine = Arc::new(escalation_machine(Arc::new(SystemClock))?);
//! let incident = machine.new_entity(EscalationFields::default())?;
//! let incident = machine.fire(&incident, "acknowledge", &TransitionArgs::none())?;
//! ```

pub mod attributes;
pub mod definition;
pub mod entity;
pub mod error;
pub mod escalation;
pub mod guard;
pub mod hook;
pub mod machine;
pub mod status;
pub mod transition;

pub use attributes::{AttributeMap, AttributeValue, TransitionArgs};
pub use definition::{
    HookAction, HookDefinition, InvariantDefinition, MachineDefinition, Requirement,
    SelectorDefinition, StatusDefinition, TransitionDefinition,
};
pub use entity::{Entity, TransitionRecord};
pub use error::{
    ConfigError, DefinitionError, LookupError, TransitionError, ValidationError, ValidationErrors,
};
pub use escalation::{
    escalation_machine, Escalation, EscalationFields, EscalationStatus, ESCALATION_DEFINITION,
};
pub use guard::{GuardLayer, Invariant};
pub use hook::{Hook, HookContext, HookSet, Targets};
pub use machine::{Select, StateMachine, ANY};
pub use status::{StatusRegistry, StatusValue};
pub use transition::{Source, TransitionRule, TransitionTable};
