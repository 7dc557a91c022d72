//! # Entities
//!
//! An entity owns exactly one current status, a set of auxiliary fields
//! whose validity depends on that status, and an append-only log of the
//! transitions it went through.
//!
//! There is no public way to assign a status: entities are created by
//! [`StateMachine::new_entity()`](crate::StateMachine::new_entity), moved by
//! [`StateMachine::fire()`](crate::StateMachine::fire), and rehydrated by
//! [`StateMachine::restore_entity()`](crate::StateMachine::restore_entity).

use serde::{Deserialize, Serialize};

use lifecycle_core::{EntityId, EventName, StatusName, Timestamp};

use crate::status::StatusValue;

/// Record of a single committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The event that caused the transition.
    pub event: EventName,
    /// Status before the transition.
    pub from: StatusName,
    /// Status after the transition.
    pub to: StatusName,
    /// When the transition committed, per the machine's clock.
    pub at: Timestamp,
}

/// An entity governed by a state machine, with auxiliary fields `F`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity<F> {
    id: EntityId,
    status: StatusValue,
    fields: F,
    created_at: Timestamp,
    #[serde(default)]
    transition_log: Vec<TransitionRecord>,
}

impl<F> Entity<F> {
    pub(crate) fn new(id: EntityId, status: StatusValue, fields: F, created_at: Timestamp) -> Self {
        Self {
            id,
            status,
            fields,
            created_at,
            transition_log: Vec::new(),
        }
    }

    /// Build the successor of `self` after a committed transition.
    pub(crate) fn advance(&self, to: StatusValue, fields: F, record: TransitionRecord) -> Self {
        let mut transition_log = Vec::with_capacity(self.transition_log.len() + 1);
        transition_log.extend(self.transition_log.iter().cloned());
        transition_log.push(record);
        Self {
            id: self.id,
            status: to,
            fields,
            created_at: self.created_at,
            transition_log,
        }
    }

    /// The entity's identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The current status.
    pub fn status(&self) -> &StatusValue {
        &self.status
    }

    /// The auxiliary fields.
    pub fn fields(&self) -> &F {
        &self.fields
    }

    /// When the entity was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Every committed transition, oldest first.
    pub fn transition_log(&self) -> &[TransitionRecord] {
        &self.transition_log
    }

    /// Number of committed transitions.
    pub fn transition_count(&self) -> usize {
        self.transition_log.len()
    }

    /// Consume the entity, returning its fields.
    pub fn into_fields(self) -> F {
        self.fields
    }
}
