//! # Transition Engine
//!
//! [`StateMachine`] ties the status registry, transition table, guard layer
//! and hooks together, and is the only way an entity changes status.
//!
//! ## Lifecycle
//!
//! A machine is configured once at startup (`register_status`,
//! `define_transition`, `register_invariant`, `before_transition`,
//! `set_initial_status`), then sealed, explicitly with
//! [`StateMachine::seal()`] or implicitly by the first
//! [`StateMachine::fire()`]. After sealing every configuration call fails
//! with [`ConfigError::ConfigurationFrozen`]. A sealed machine is immutable
//! and can be shared across threads behind an `Arc`.
//!
//! ## Firing
//!
//! ```text
//! resolve(event, status) ──▶ hooks(working copy) ──▶ guards(working copy) ──▶ commit
//!        │                                                 │
//!        └── NoSuchTransition                              └── Validation(errors)
//! ```
//!
//! `fire()` borrows the entity immutably and returns its successor, so a
//! rejected transition leaves the input untouched.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lifecycle_core::{Clock, EntityId, EventName, StatusName, SystemClock, Timestamp};

use crate::attributes::TransitionArgs;
use crate::entity::{Entity, TransitionRecord};
use crate::error::{ConfigError, LookupError, TransitionError, ValidationErrors};
use crate::guard::GuardLayer;
use crate::hook::{HookContext, HookSet, Targets};
use crate::status::{StatusRegistry, StatusValue};
use crate::transition::{Source, TransitionRule, TransitionTable};

// ─── Status Selection ────────────────────────────────────────────────

/// A set of statuses named at configuration time.
///
/// Used for transition sources and hook targets. For transition sources,
/// `Except` is expanded against the statuses registered so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Select {
    /// Every status.
    Any,
    /// Exactly these statuses.
    Only(Vec<String>),
    /// Every status but these.
    Except(Vec<String>),
}

/// Shorthand for [`Select::Any`].
pub const ANY: Select = Select::Any;

impl Select {
    /// Exactly the named statuses.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Every status except the named ones.
    pub fn except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Except(names.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Select {
    fn from(name: &str) -> Self {
        Self::Only(vec![name.to_string()])
    }
}

impl<const N: usize> From<[&str; N]> for Select {
    fn from(names: [&str; N]) -> Self {
        Self::only(names)
    }
}

impl From<&[&str]> for Select {
    fn from(names: &[&str]) -> Self {
        Self::only(names.iter().copied())
    }
}

impl From<Vec<String>> for Select {
    fn from(names: Vec<String>) -> Self {
        Self::Only(names)
    }
}

// ─── State Machine ───────────────────────────────────────────────────

/// A configured status state machine over entities with auxiliary fields `F`.
pub struct StateMachine<F> {
    name: String,
    registry: StatusRegistry,
    table: TransitionTable,
    guards: GuardLayer<F>,
    hooks: HookSet<F>,
    initial: Option<StatusValue>,
    clock: Arc<dyn Clock>,
    sealed: AtomicBool,
}

impl<F> fmt::Debug for StateMachine<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .field("table", &self.table)
            .field("guards", &self.guards)
            .field("hooks", &self.hooks)
            .field("initial", &self.initial)
            .field("clock", &self.clock)
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

impl<F> StateMachine<F> {
    /// An empty, unsealed machine using the system clock.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_clock(name, Arc::new(SystemClock))
    }

    /// An empty, unsealed machine reading time from `clock`.
    pub fn with_clock(name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            registry: StatusRegistry::new(),
            table: TransitionTable::new(),
            guards: GuardLayer::new(),
            hooks: HookSet::new(),
            initial: None,
            clock,
            sealed: AtomicBool::new(false),
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    fn ensure_unsealed(&self, operation: &'static str) -> Result<(), ConfigError> {
        if self.is_sealed() {
            return Err(ConfigError::ConfigurationFrozen { operation });
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<StatusValue, ConfigError> {
        self.registry
            .status_by_name(name)
            .cloned()
            .map_err(|_| ConfigError::UnknownStatus {
                name: name.to_string(),
            })
    }

    fn lookup_all(&self, names: &[String]) -> Result<BTreeSet<StatusValue>, ConfigError> {
        names.iter().map(|name| self.lookup(name)).collect()
    }

    /// Register a status with a stable ordinal.
    pub fn register_status(&mut self, name: &str, ordinal: i32) -> Result<StatusValue, ConfigError> {
        self.ensure_unsealed("register a status")?;
        let name = StatusName::new(name)?;
        self.registry.register_status(name, ordinal)
    }

    /// Define a transition rule.
    ///
    /// `Select::Except` sources are expanded against the statuses
    /// registered at the time of the call; statuses registered later are
    /// not part of the source. Hook targets built with `Select::except` are
    /// instead matched when the hook runs. Register every status first.
    ///
    /// ```text
    /// machine.define_transition("resolve", ANY, "resolved")?;
    /// machine.define_transition("acknowledge", ["triggered"], "acknowledged")?;
    /// machine.define_transition("trigger", Select::except(["triggered"]), "triggered")?;
    /// ```
    pub fn define_transition(
        &mut self,
        event: &str,
        from: impl Into<Select>,
        to: &str,
    ) -> Result<(), ConfigError> {
        self.ensure_unsealed("define a transition")?;
        let event = EventName::new(event)?;
        let to = self.lookup(to)?;
        let source = match from.into() {
            Select::Any => Source::Any,
            Select::Only(names) => Source::Only(self.lookup_all(&names)?),
            Select::Except(names) => {
                let excluded = self.lookup_all(&names)?;
                Source::Only(
                    self.registry
                        .all_statuses()
                        .filter(|status| !excluded.contains(*status))
                        .cloned()
                        .collect(),
                )
            }
        };
        self.table.define_transition(event, source, to)?;
        Ok(())
    }

    /// Register an invariant that must hold for an entity to enter `status`.
    pub fn register_invariant<P>(
        &mut self,
        status: &str,
        predicate: P,
        message: impl Into<String>,
    ) -> Result<(), ConfigError>
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        self.ensure_unsealed("register an invariant")?;
        let status = self.lookup(status)?;
        self.guards.register_invariant(&status, predicate, message);
        Ok(())
    }

    /// Register a hook run before transitions into `targets`.
    pub fn before_transition<H>(&mut self, targets: impl Into<Select>, hook: H) -> Result<(), ConfigError>
    where
        H: Fn(&mut F, &HookContext<'_>) + Send + Sync + 'static,
    {
        self.ensure_unsealed("register a hook")?;
        let targets = match targets.into() {
            Select::Any => Targets::Any,
            Select::Only(names) => Targets::Only(self.lookup_all(&names)?),
            Select::Except(names) => Targets::Except(self.lookup_all(&names)?),
        };
        self.hooks.before_transition(targets, hook);
        Ok(())
    }

    /// Declare the status new entities start in.
    pub fn set_initial_status(&mut self, name: &str) -> Result<(), ConfigError> {
        self.ensure_unsealed("set the initial status")?;
        self.initial = Some(self.lookup(name)?);
        Ok(())
    }

    /// Replace the clock used by hooks and transition records.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) -> Result<(), ConfigError> {
        self.ensure_unsealed("replace the clock")?;
        self.clock = clock;
        Ok(())
    }

    /// Freeze the configuration. Idempotent.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::AcqRel) {
            tracing::info!(
                machine = %self.name,
                statuses = self.registry.len(),
                rules = self.table.len(),
                invariants = self.guards.len(),
                hooks = self.hooks.len(),
                "state machine sealed"
            );
        }
    }

    /// Whether the configuration is frozen.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The machine's name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a status by name.
    pub fn status_by_name(&self, name: &str) -> Result<&StatusValue, LookupError> {
        self.registry.status_by_name(name)
    }

    /// Look up a status by its persisted ordinal.
    pub fn status_by_ordinal(&self, ordinal: i32) -> Result<&StatusValue, LookupError> {
        self.registry.status_by_ordinal(ordinal)
    }

    /// Every status, in registration order.
    pub fn all_statuses(&self) -> std::slice::Iter<'_, StatusValue> {
        self.registry.all_statuses()
    }

    /// The status new entities start in, once declared.
    pub fn initial_status(&self) -> Option<&StatusValue> {
        self.initial.as_ref()
    }

    /// Whether `status` is registered here under the same name and ordinal.
    pub fn is_registered(&self, status: &StatusValue) -> bool {
        self.registry.verify(status).is_ok()
    }

    fn rule_for(&self, event: &str, current: &StatusValue) -> Option<&TransitionRule> {
        if !self.is_registered(current) {
            return None;
        }
        self.table.rule_for(event, current)
    }

    /// The status `event` leads to from `current`.
    ///
    /// A status this machine never registered has no transitions.
    pub fn resolve(&self, event: &str, current: &StatusValue) -> Result<&StatusValue, TransitionError> {
        self.rule_for(event, current)
            .map(|rule| &rule.to)
            .ok_or_else(|| TransitionError::NoSuchTransition {
                event: event.to_string(),
                status: current.name().clone(),
            })
    }

    /// Events that can fire from `status`. Empty for unregistered statuses.
    pub fn events_available_from(&self, status: &StatusValue) -> BTreeSet<EventName> {
        if !self.is_registered(status) {
            return BTreeSet::new();
        }
        self.table.events_available_from(status)
    }

    /// The first event, in definition order, moving `from` to `to` in one hop.
    pub fn event_for(&self, from: &StatusValue, to: &StatusValue) -> Option<&EventName> {
        if !self.is_registered(from) || !self.is_registered(to) {
            return None;
        }
        self.table.event_for(from, to)
    }

    /// Run the guard layer without firing.
    pub fn validate(&self, fields: &F, candidate: &StatusValue) -> Result<(), ValidationErrors> {
        self.guards.validate(fields, candidate)
    }

    /// The status registry.
    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    /// The transition table.
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// The guard layer.
    pub fn guards(&self) -> &GuardLayer<F> {
        &self.guards
    }

    /// The registered hooks.
    pub fn hooks(&self) -> &HookSet<F> {
        &self.hooks
    }

    /// The clock hooks read.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ── Entities ─────────────────────────────────────────────────────

    /// Create an entity in the initial status.
    ///
    /// The initial fields are not validated; the first transition is.
    pub fn new_entity(&self, fields: F) -> Result<Entity<F>, ConfigError> {
        let initial = self.initial.clone().ok_or(ConfigError::MissingInitialStatus)?;
        Ok(Entity::new(EntityId::new(), initial, fields, self.clock.now()))
    }

    /// Rehydrate an entity from persisted parts.
    pub fn restore_entity(
        &self,
        id: EntityId,
        ordinal: i32,
        fields: F,
        created_at: Timestamp,
    ) -> Result<Entity<F>, LookupError> {
        let status = self.registry.status_by_ordinal(ordinal)?.clone();
        Ok(Entity::new(id, status, fields, created_at))
    }

    /// Check that a deserialized entity's status is registered here.
    pub fn check_entity(&self, entity: &Entity<F>) -> Result<(), LookupError> {
        self.registry.verify(entity.status()).map(|_| ())
    }
}

impl<F: Clone> StateMachine<F> {
    /// Fire `event` on `entity`, returning its successor.
    ///
    /// Seals the machine on first use.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NoSuchTransition`] if no rule permits `event`
    ///   from the entity's status, or that status is not registered here.
    /// - [`TransitionError::Validation`] if invariants of the target status
    ///   fail after hooks ran.
    ///
    /// In both cases `entity` is unchanged.
    pub fn fire(
        &self,
        entity: &Entity<F>,
        event: &str,
        args: &TransitionArgs,
    ) -> Result<Entity<F>, TransitionError> {
        self.seal();

        let from = entity.status();
        let Some(rule) = self.rule_for(event, from) else {
            tracing::debug!(
                machine = %self.name,
                entity = %entity.id(),
                event,
                status = %from,
                "transition not available"
            );
            return Err(TransitionError::NoSuchTransition {
                event: event.to_string(),
                status: from.name().clone(),
            });
        };
        let to = &rule.to;

        let mut working = entity.fields().clone();
        let ctx = HookContext {
            event: &rule.event,
            from,
            to,
            args,
            clock: self.clock.as_ref(),
        };
        let ran = self.hooks.run(&mut working, &ctx);
        tracing::trace!(machine = %self.name, event, to = %to, hooks = ran, "hooks applied");

        if let Err(errors) = self.guards.validate(&working, to) {
            tracing::debug!(
                machine = %self.name,
                entity = %entity.id(),
                event,
                from = %from,
                to = %to,
                failures = errors.len(),
                "transition failed validation"
            );
            return Err(TransitionError::Validation(errors));
        }

        let record = TransitionRecord {
            event: rule.event.clone(),
            from: from.name().clone(),
            to: to.name().clone(),
            at: self.clock.now(),
        };
        tracing::debug!(
            machine = %self.name,
            entity = %entity.id(),
            event,
            from = %from,
            to = %to,
            "transition committed"
        );
        Ok(entity.advance(to.clone(), working, record))
    }

    /// Fire `event` and replace `entity` with its successor on success.
    pub fn fire_in_place(
        &self,
        entity: &mut Entity<F>,
        event: &str,
        args: &TransitionArgs,
    ) -> Result<(), TransitionError> {
        *entity = self.fire(entity, event, args)?;
        Ok(())
    }
}
