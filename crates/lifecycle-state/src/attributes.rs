//! # Attribute Values
//!
//! Loosely typed values used for two things: arguments passed to `fire()`
//! (the resolution timestamp, a note) and the auxiliary fields of machines
//! built from YAML definitions, whose field set is only known at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lifecycle_core::Timestamp;

/// A single argument or field value.
///
/// Serialized untagged; RFC 3339 strings deserialize as timestamps, other
/// strings as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer.
    Integer(i64),
    /// A UTC timestamp.
    Timestamp(Timestamp),
    /// Free text.
    Text(String),
}

impl AttributeValue {
    /// The timestamp, if this value is one.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<Timestamp> for AttributeValue {
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Named auxiliary fields of a definition-driven entity.
///
/// A field is either present with a value or absent; clearing a field
/// removes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, AttributeValue>);

impl AttributeMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.0.get(field)
    }

    /// Set `field`, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.0.insert(field.into(), value.into())
    }

    /// Remove `field`, returning the previous value.
    pub fn clear(&mut self, field: &str) -> Option<AttributeValue> {
        self.0.remove(field)
    }

    /// Whether `field` is present.
    pub fn is_present(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// The timestamp stored in `field`, if present and a timestamp.
    pub fn timestamp(&self, field: &str) -> Option<Timestamp> {
        self.get(field).and_then(AttributeValue::as_timestamp)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of present fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Explicit arguments passed to `fire()`, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionArgs(Vec<AttributeValue>);

impl TransitionArgs {
    /// No arguments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Append an argument.
    pub fn with(mut self, value: impl Into<AttributeValue>) -> Self {
        self.0.push(value.into());
        self
    }

    /// The first argument, if any.
    pub fn first(&self) -> Option<&AttributeValue> {
        self.0.first()
    }

    /// The first argument if it is a timestamp.
    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.first().and_then(AttributeValue::as_timestamp)
    }

    /// All arguments.
    pub fn as_slice(&self) -> &[AttributeValue] {
        &self.0
    }

    /// Whether no argument was passed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<AttributeValue>> for TransitionArgs {
    fn from(values: Vec<AttributeValue>) -> Self {
        Self(values)
    }
}
