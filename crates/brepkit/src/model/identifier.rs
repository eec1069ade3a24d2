//! Model-level identifiers.
//!
//! A [`Uuid`] is a 128-bit opaque identifier with a canonical hyphenated
//! string form, generated as a random (v4) uuid; a [`ComponentId`] pairs
//! it with the component type tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Uuid(uuid::Uuid);

impl Uuid {
    /// A fresh unique identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub const fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub const fn from_bits(bits: u128) -> Self {
        Self(uuid::Uuid::from_u128(bits))
    }

    pub const fn as_bits(&self) -> u128 {
        self.0.as_u128()
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

impl FromStr for Uuid {
    type Err = uuid::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(Self(uuid::Uuid::from_str(text)?))
    }
}

/// Static tag naming a component kind (`"Corner3D"`, `"Block"`, ...).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ComponentType(pub &'static str);

impl fmt::Display for ComponentType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.0)
    }
}

/// Identity of a model component: its type tag plus its uuid.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct ComponentId {
    pub component_type: ComponentType,
    pub id: Uuid,
}

impl ComponentId {
    pub fn new(component_type: ComponentType, id: Uuid) -> Self {
        Self { component_type, id }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}({})", self.component_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuids_are_unique() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(Uuid::new()));
        }
    }

    #[test]
    fn string_round_trip() {
        let id = Uuid::new();
        let text = id.to_string();
        // Canonical hyphenated form.
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<Uuid>().unwrap(), id);
    }

    #[test]
    fn nil_is_not_generated() {
        assert!(Uuid::nil().is_nil());
        assert!(!Uuid::new().is_nil());
        assert_eq!(Uuid::from_bits(7).as_bits(), 7);
    }
}
