//! # Status Registry
//!
//! The finite set of named statuses an entity can hold, each paired with a
//! stable integer ordinal. Ordinals are what a persistence layer stores in
//! its status column, so once assigned they never change.
//!
//! Names and ordinals are both unique within a registry; registration order
//! is preserved and drives [`StatusRegistry::all_statuses()`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lifecycle_core::StatusName;

use crate::error::{ConfigError, LookupError};

/// An immutable `(name, ordinal)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusValue {
    name: StatusName,
    ordinal: i32,
}

impl StatusValue {
    /// Pair a name with an ordinal.
    ///
    /// A value built here is only meaningful once registered; machines
    /// resolve every status through their registry.
    pub fn new(name: StatusName, ordinal: i32) -> Self {
        Self { name, ordinal }
    }

    /// The canonical name.
    pub fn name(&self) -> &StatusName {
        &self.name
    }

    /// The persisted ordinal.
    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }
}

impl std::fmt::Display for StatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name.as_str())
    }
}

/// Name ↔ ordinal lookups over the registered statuses.
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    statuses: Vec<StatusValue>,
    by_name: HashMap<StatusName, usize>,
    by_ordinal: HashMap<i32, usize>,
}

impl StatusRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a status.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateStatusName`] if the name is taken,
    /// [`ConfigError::DuplicateOrdinal`] if the ordinal is taken.
    pub fn register_status(
        &mut self,
        name: StatusName,
        ordinal: i32,
    ) -> Result<StatusValue, ConfigError> {
        if self.by_name.contains_key(&name) {
            return Err(ConfigError::DuplicateStatusName { name });
        }
        if let Some(&idx) = self.by_ordinal.get(&ordinal) {
            return Err(ConfigError::DuplicateOrdinal {
                ordinal,
                existing: self.statuses[idx].name.clone(),
            });
        }

        let value = StatusValue::new(name.clone(), ordinal);
        let idx = self.statuses.len();
        self.statuses.push(value.clone());
        self.by_name.insert(name, idx);
        self.by_ordinal.insert(ordinal, idx);
        Ok(value)
    }

    /// Look up a status by name.
    pub fn status_by_name(&self, name: &str) -> Result<&StatusValue, LookupError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.statuses[idx])
            .ok_or_else(|| LookupError::UnknownStatus {
                name: name.to_string(),
            })
    }

    /// Look up a status by its persisted ordinal.
    pub fn status_by_ordinal(&self, ordinal: i32) -> Result<&StatusValue, LookupError> {
        self.by_ordinal
            .get(&ordinal)
            .map(|&idx| &self.statuses[idx])
            .ok_or(LookupError::UnknownOrdinal { ordinal })
    }

    /// Every registered status, in registration order.
    ///
    /// The iterator borrows the registry and can be recreated at will.
    pub fn all_statuses(&self) -> std::slice::Iter<'_, StatusValue> {
        self.statuses.iter()
    }

    /// Whether this exact status (name and ordinal) is registered.
    pub fn contains(&self, status: &StatusValue) -> bool {
        self.by_name
            .get(status.name.as_str())
            .is_some_and(|&idx| self.statuses[idx].ordinal == status.ordinal)
    }

    /// Check that a status carried by an entity matches the registry.
    pub fn verify(&self, status: &StatusValue) -> Result<&StatusValue, LookupError> {
        let registered = self.status_by_ordinal(status.ordinal)?;
        if registered.name != status.name {
            return Err(LookupError::Mismatch {
                ordinal: status.ordinal,
                name: status.name.clone(),
                registered: registered.name.clone(),
            });
        }
        Ok(registered)
    }

    /// Number of registered statuses.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
