//! # Guard Layer
//!
//! Per-status invariants over an entity's auxiliary fields. Before a
//! transition commits, every invariant registered for the target status is
//! evaluated against the post-hook working copy of the fields. All failures
//! are collected, not just the first.

use std::fmt;

use lifecycle_core::StatusName;

use crate::error::{ValidationError, ValidationErrors};
use crate::status::StatusValue;

type Predicate<F> = Box<dyn Fn(&F) -> bool + Send + Sync>;

/// A predicate that must hold for an entity to be in `status`.
pub struct Invariant<F> {
    status: StatusName,
    message: String,
    predicate: Predicate<F>,
}

impl<F> Invariant<F> {
    /// The status this invariant guards.
    pub fn status(&self) -> &StatusName {
        &self.status
    }

    /// The message reported when the predicate fails.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Evaluate against candidate fields.
    pub fn holds(&self, fields: &F) -> bool {
        (self.predicate)(fields)
    }
}

impl<F> fmt::Debug for Invariant<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invariant")
            .field("status", &self.status)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// The registered invariants of a machine.
pub struct GuardLayer<F> {
    invariants: Vec<Invariant<F>>,
}

impl<F> Default for GuardLayer<F> {
    fn default() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }
}

impl<F> fmt::Debug for GuardLayer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.invariants).finish()
    }
}

impl<F> GuardLayer<F> {
    /// An empty guard layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an invariant for `status`.
    pub fn register_invariant<P>(&mut self, status: &StatusValue, predicate: P, message: impl Into<String>)
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        self.invariants.push(Invariant {
            status: status.name().clone(),
            message: message.into(),
            predicate: Box::new(predicate),
        });
    }

    /// Run every invariant registered for `candidate` against `fields`.
    ///
    /// # Errors
    ///
    /// All failing invariants, in registration order.
    pub fn validate(&self, fields: &F, candidate: &StatusValue) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for invariant in self.invariants_for(candidate) {
            if !invariant.holds(fields) {
                errors.push(ValidationError {
                    status: invariant.status.clone(),
                    message: invariant.message.clone(),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The invariants guarding `status`.
    pub fn invariants_for<'a>(&'a self, status: &'a StatusValue) -> impl Iterator<Item = &'a Invariant<F>> + 'a {
        self.invariants
            .iter()
            .filter(move |invariant| invariant.status == *status.name())
    }

    /// Total number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Whether no invariants are registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
