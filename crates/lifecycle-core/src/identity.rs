//! # Identity Newtypes
//!
//! Newtype wrappers for entity identifiers and the symbolic names used in
//! transition tables. A `StatusName` cannot be passed where an `EventName`
//! is expected, and neither can be constructed from an unvalidated string.
//!
//! ## Name rules
//!
//! Status and event names are snake_case symbols: 1–64 bytes, lowercase
//! ASCII letters, digits and `_`, starting with a letter.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LifecycleError;

/// Maximum length of a status or event name.
pub const MAX_NAME_LEN: usize = 64;

/// Unique identifier for an entity governed by a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generate a new random entity identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name must not be empty");
    }
    if name.len() > MAX_NAME_LEN {
        return Err("name exceeds 64 bytes");
    }
    if !name.as_bytes()[0].is_ascii_lowercase() {
        return Err("name must start with a lowercase letter");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    {
        return Err("name may only contain lowercase letters, digits and '_'");
    }
    Ok(())
}

macro_rules! validated_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a name.
            pub fn new(name: impl Into<String>) -> Result<Self, LifecycleError> {
                let name = name.into();
                match validate_name(&name) {
                    Ok(()) => Ok(Self(name)),
                    Err(reason) => Err(LifecycleError::InvalidName { name, reason }),
                }
            }

            /// The name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = LifecycleError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = LifecycleError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = LifecycleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

validated_name!(
    /// Canonical identifier of a status (e.g. `acknowledged`).
    StatusName
);

validated_name!(
    /// Name of an event a caller may fire (e.g. `resolve`).
    EventName
);


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn valid_names_roundtrip_through_string(name in "[a-z][a-z0-9_]{0,63}") {
            let status = StatusName::new(name.clone()).unwrap();
            let back: String = status.into();
            prop_assert_eq!(back, name);
        }

        #[test]
        fn uppercase_is_always_rejected(name in "[a-z]{0,10}[A-Z][a-zA-Z]{0,10}") {
            prop_assert!(EventName::new(name).is_err());
        }
    }
}
