//! # Declarative Machine Definitions
//!
//! Machines can be described as YAML documents and built into a
//! [`StateMachine<AttributeMap>`]. Statuses, transition rules, invariants and
//! hooks are all data; the only hook actions and invariant requirements are
//! the ones timestamp lifecycles need.
//!
//! ```yaml
//! name: escalation
//! initial: triggered
//! statuses:
//!   - { name: triggered, ordinal: 0 }
//!   - { name: resolved, ordinal: 2 }
//! transitions:
//!   - { event: resolve, from: any, to: resolved }
//!   - { event: trigger, from: { except: [triggered] }, to: triggered }
//! invariants:
//!   - { status: resolved, require: present, field: resolved_at }
//! hooks:
//!   - { to: [resolved], action: stamp, field: resolved_at }
//!   - { to: { except: [resolved] }, action: clear, field: resolved_at }
//! ```
//!
//! Selectors (`from`, `to`, `status`) accept `any`, a single status name, a
//! list of names, or `{ except: [...] }`.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lifecycle_core::{Clock, SystemClock};

use crate::attributes::AttributeMap;
use crate::error::{ConfigError, DefinitionError};
use crate::hook::HookContext;
use crate::machine::{Select, StateMachine};

/// The literal `any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnyKeyword {
    /// Every status.
    Any,
}

/// A status selector as written in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorDefinition {
    /// `any`
    Any(AnyKeyword),
    /// `resolved`
    Single(String),
    /// `[triggered, acknowledged]`
    List(Vec<String>),
    /// `{ except: [resolved] }`
    Except {
        /// Statuses excluded from the selection.
        except: Vec<String>,
    },
}

impl From<&SelectorDefinition> for Select {
    fn from(def: &SelectorDefinition) -> Self {
        match def {
            SelectorDefinition::Any(_) => Select::Any,
            SelectorDefinition::Single(name) => Select::Only(vec![name.clone()]),
            SelectorDefinition::List(names) => Select::Only(names.clone()),
            SelectorDefinition::Except { except } => Select::Except(except.clone()),
        }
    }
}

/// A registered status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefinition {
    /// Canonical name.
    pub name: String,
    /// Stable persisted ordinal.
    pub ordinal: i32,
}

/// A transition rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    /// Event name.
    pub event: String,
    /// Source statuses.
    pub from: SelectorDefinition,
    /// Target status.
    pub to: String,
}

/// What an invariant requires of its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// The field must be set.
    Present,
    /// The field must be unset.
    Absent,
}

/// A field invariant for one or more statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantDefinition {
    /// Statuses the invariant guards.
    pub status: SelectorDefinition,
    /// Presence requirement.
    pub require: Requirement,
    /// Field name.
    pub field: String,
    /// Failure message; defaults to `<field> must be present|absent`.
    #[serde(default)]
    pub message: Option<String>,
}

impl InvariantDefinition {
    fn message(&self) -> String {
        self.message.clone().unwrap_or_else(|| match self.require {
            Requirement::Present => format!("{} must be present", self.field),
            Requirement::Absent => format!("{} must be absent", self.field),
        })
    }
}

/// What a hook does to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookAction {
    /// Set the field to the first timestamp argument, or the clock's now.
    Stamp,
    /// Remove the field.
    Clear,
}

/// A before-transition hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Target statuses.
    pub to: SelectorDefinition,
    /// Action applied to `field`.
    pub action: HookAction,
    /// Field name.
    pub field: String,
}

/// A complete machine definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDefinition {
    /// Machine name, used in logs.
    pub name: String,
    /// Status new entities start in.
    pub initial: String,
    /// Statuses, in registration order.
    pub statuses: Vec<StatusDefinition>,
    /// Transition rules, in definition order.
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
    /// Field invariants.
    #[serde(default)]
    pub invariants: Vec<InvariantDefinition>,
    /// Before-transition hooks, in registration order.
    #[serde(default)]
    pub hooks: Vec<HookDefinition>,
}

impl MachineDefinition {
    /// Parse a YAML definition.
    pub fn from_yaml(yaml: &str) -> Result<Self, DefinitionError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML definition file.
    pub fn from_path(path: &Path) -> Result<Self, DefinitionError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String, DefinitionError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build an unsealed machine using the system clock.
    pub fn build(&self) -> Result<StateMachine<AttributeMap>, DefinitionError> {
        self.build_with_clock(Arc::new(SystemClock))
    }

    /// Build an unsealed machine reading time from `clock`.
    ///
    /// Statuses are registered first, so selectors may reference any status
    /// regardless of where it appears in the document.
    pub fn build_with_clock(&self, clock: Arc<dyn Clock>) -> Result<StateMachine<AttributeMap>, DefinitionError> {
        let mut machine = StateMachine::with_clock(self.name.clone(), clock);

        for status in &self.statuses {
            machine.register_status(&status.name, status.ordinal)?;
        }
        machine.set_initial_status(&self.initial)?;

        for rule in &self.transitions {
            machine.define_transition(&rule.event, Select::from(&rule.from), &rule.to)?;
        }

        for invariant in &self.invariants {
            let message = invariant.message();
            for status in selected_statuses(&machine, &invariant.status)? {
                let field = invariant.field.clone();
                match invariant.require {
                    Requirement::Present => machine.register_invariant(
                        &status,
                        move |fields: &AttributeMap| fields.is_present(&field),
                        message.clone(),
                    )?,
                    Requirement::Absent => machine.register_invariant(
                        &status,
                        move |fields: &AttributeMap| !fields.is_present(&field),
                        message.clone(),
                    )?,
                }
            }
        }

        for hook in &self.hooks {
            let field = hook.field.clone();
            match hook.action {
                HookAction::Stamp => machine.before_transition(
                    Select::from(&hook.to),
                    move |fields: &mut AttributeMap, ctx: &HookContext<'_>| {
                        fields.set(field.clone(), ctx.timestamp_arg_or_now());
                    },
                )?,
                HookAction::Clear => machine.before_transition(
                    Select::from(&hook.to),
                    move |fields: &mut AttributeMap, _: &HookContext<'_>| {
                        fields.clear(&field);
                    },
                )?,
            }
        }

        tracing::debug!(
            machine = %self.name,
            statuses = self.statuses.len(),
            rules = self.transitions.len(),
            "built machine from definition"
        );
        Ok(machine)
    }
}

/// Expand a selector to concrete status names against the registry.
fn selected_statuses(
    machine: &StateMachine<AttributeMap>,
    selector: &SelectorDefinition,
) -> Result<Vec<String>, ConfigError> {
    let known = |name: &String| -> Result<String, ConfigError> {
        machine
            .status_by_name(name)
            .map(|status| status.name().to_string())
            .map_err(|_| ConfigError::UnknownStatus { name: name.clone() })
    };
    match Select::from(selector) {
        Select::Any => Ok(machine.all_statuses().map(|s| s.name().to_string()).collect()),
        Select::Only(names) => names.iter().map(known).collect(),
        Select::Except(names) => {
            let excluded = names.iter().map(known).collect::<Result<Vec<_>, _>>()?;
            Ok(machine
                .all_statuses()
                .map(|s| s.name().to_string())
                .filter(|name| !excluded.contains(name))
                .collect())
        }
    }
}
