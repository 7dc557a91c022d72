//! # Error Types
//!
//! Errors are split by when they can occur:
//!
//! - [`ConfigError`] — configuration time. These indicate a programming
//!   error in a machine definition and should abort startup.
//! - [`LookupError`] — a status name or ordinal that was never registered.
//!   Recoverable; surfaced as invalid input.
//! - [`TransitionError`] — a rejected `fire()`. Recoverable and expected;
//!   surfaced as "action not available" or as field-level messages.
//! - [`DefinitionError`] — loading a YAML machine definition.

use std::fmt;

use lifecycle_core::{EventName, LifecycleError, StatusName};
use thiserror::Error;

use crate::transition::Source;

/// Errors raised while configuring a state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A status or event name failed validation.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected input.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The status name is already registered.
    #[error("duplicate status: {name} is already registered")]
    DuplicateStatusName {
        /// The duplicated name.
        name: StatusName,
    },

    /// The ordinal is already assigned to another status.
    #[error("duplicate status: ordinal {ordinal} is already assigned to {existing}")]
    DuplicateOrdinal {
        /// The duplicated ordinal.
        ordinal: i32,
        /// The status that owns the ordinal.
        existing: StatusName,
    },

    /// A rule for the same event already covers one of the requested sources.
    #[error("conflicting transition for event {event}: sources {requested} overlap existing rule from {existing}")]
    ConflictingTransition {
        /// The event being defined.
        event: EventName,
        /// Sources of the rule already in the table.
        existing: Source,
        /// Sources of the rejected rule.
        requested: Source,
    },

    /// A transition rule listed no source statuses.
    #[error("transition for event {event} has an empty source set")]
    EmptySource {
        /// The event being defined.
        event: EventName,
    },

    /// The definition referenced a status that was never registered.
    #[error("unknown status {name} referenced during configuration")]
    UnknownStatus {
        /// The unregistered name.
        name: String,
    },

    /// No initial status has been declared.
    #[error("no initial status declared")]
    MissingInitialStatus,

    /// The machine was sealed; configuration can no longer change.
    #[error("configuration is frozen: cannot {operation} after the machine is sealed")]
    ConfigurationFrozen {
        /// The rejected configuration operation.
        operation: &'static str,
    },

    /// A core-layer error other than name validation, rendered.
    #[error("core error: {0}")]
    Core(String),
}

impl From<LifecycleError> for ConfigError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidName { name, reason } => Self::InvalidName {
                name,
                reason: reason.to_string(),
            },
            other => Self::Core(other.to_string()),
        }
    }
}

/// A status lookup by name or ordinal found nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No status with this name.
    #[error("unknown status: {name}")]
    UnknownStatus {
        /// The requested name.
        name: String,
    },

    /// No status with this ordinal.
    #[error("unknown status ordinal: {ordinal}")]
    UnknownOrdinal {
        /// The requested ordinal.
        ordinal: i32,
    },

    /// A status is registered under this ordinal but with another name.
    #[error("status ordinal {ordinal} is registered as {registered}, not {name}")]
    Mismatch {
        /// The ordinal carried by the entity.
        ordinal: i32,
        /// The name carried by the entity.
        name: StatusName,
        /// The name the registry holds for the ordinal.
        registered: StatusName,
    },
}

/// A single violated invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The candidate status whose invariant failed.
    pub status: StatusName,
    /// Field-level message, e.g. `resolved_at must be present`.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every invariant that failed for a candidate status, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// An empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Whether no invariant failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failed invariants.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate failures in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// The failure messages, in registration order.
    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.message.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A rejected `fire()`.
///
/// Both variants are normal outcomes to report to the caller, never
/// system faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// No rule permits the event from the entity's current status.
    #[error("action `{event}` is not currently available from status `{status}`")]
    NoSuchTransition {
        /// The requested event, as given by the caller.
        event: String,
        /// The entity's current status.
        status: StatusName,
    },

    /// One or more invariants of the target status failed.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
}

impl TransitionError {
    /// The validation failures, if this is a validation rejection.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::NoSuchTransition { .. } => None,
        }
    }
}

/// Errors loading a declarative machine definition.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// The YAML document could not be parsed.
    #[error("failed to parse machine definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The definition file could not be read.
    #[error("failed to read machine definition {path}: {source}")]
    Io {
        /// Path of the definition file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The definition is well-formed YAML but describes an invalid machine.
    #[error("invalid machine definition: {0}")]
    Config(#[from] ConfigError),
}

impl From<ConfigError> for LifecycleError {
    fn from(err: ConfigError) -> Self {
        LifecycleError::Configuration(err.to_string())
    }
}

impl From<LookupError> for LifecycleError {
    fn from(err: LookupError) -> Self {
        LifecycleError::Lookup(err.to_string())
    }
}

impl From<TransitionError> for LifecycleError {
    fn from(err: TransitionError) -> Self {
        LifecycleError::Transition(err.to_string())
    }
}

impl From<DefinitionError> for LifecycleError {
    fn from(err: DefinitionError) -> Self {
        LifecycleError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str) -> StatusName {
        StatusName::new(name).unwrap()
    }

    #[test]
    fn core_errors_keep_their_kind_in_config_errors() {
        let name_err = StatusName::new("Bad").unwrap_err();
        assert!(matches!(
            ConfigError::from(name_err),
            ConfigError::InvalidName { ref name, .. } if name == "Bad"
        ));

        let other = ConfigError::from(LifecycleError::InvalidTimestamp("not a time".to_string()));
        assert!(matches!(other, ConfigError::Core(_)));
        assert!(other.to_string().contains("not a time"));
    }

    #[test]
    fn no_such_transition_reads_as_unavailable_action() {
        let err = TransitionError::NoSuchTransition {
            event: "close".to_string(),
            status: status("triggered"),
        };
        assert_eq!(
            err.to_string(),
            "action `close` is not currently available from status `triggered`"
        );
        assert!(err.validation_errors().is_none());
    }

    #[test]
    fn validation_errors_list_each_message() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError {
            status: status("resolved"),
            message: "resolved_at must be present".to_string(),
        });
        errors.push(ValidationError {
            status: status("resolved"),
            message: "owner must be present".to_string(),
        });
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "resolved_at must be present; owner must be present"
        );
        let err = TransitionError::Validation(errors);
        assert_eq!(err.validation_errors().map(ValidationErrors::len), Some(2));
    }

    #[test]
    fn config_error_converts_to_lifecycle_error() {
        let err: LifecycleError = ConfigError::MissingInitialStatus.into();
        assert!(matches!(err, LifecycleError::Configuration(_)));
    }

    #[test]
    fn invalid_name_maps_into_config_error() {
        let err: ConfigError = StatusName::new("Nope").unwrap_err().into();
        assert!(matches!(err, ConfigError::InvalidName { ref name, .. } if name == "Nope"));
    }
}
