use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable identity of a registered component.
///
/// A `ComponentId` is a random 128-bit UUID assigned once when the component
/// is created and never reassigned. Its canonical rendering (hyphenated,
/// lowercase) is also the file stem under which the component is persisted
/// in a store directory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(uuid::Uuid);

impl ComponentId {
    /// Generate a fresh random identity (UUID v4).
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Canonical string form, used for file names in store directories.
    pub fn canonical(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.canonical()[..8].to_string()
    }

    /// Parse a component identity from any UUID rendering.
    ///
    /// Accepts the hyphenated, simple, braced, and URN forms. Surrounding
    /// whitespace is not trimmed.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidIdentity {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ComponentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<uuid::Uuid> for ComponentId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.short_id())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
