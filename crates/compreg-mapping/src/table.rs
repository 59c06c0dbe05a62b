//! The [`MappingTable`]: human-readable keys to identity records.
//!
//! The table is the single source of truth for which components are
//! registered. It enforces two invariants on every write:
//!
//! - keys are valid (see [`crate::names`]) and unique,
//! - no two keys share a [`ComponentId`].
//!
//! The second invariant is what makes identity → key inversion well defined,
//! so it is checked here, at construction time, rather than by readers.

use std::collections::{BTreeMap, HashMap};

use compreg_types::{ComponentId, IdentityRecord, SourceRef};
use serde::{Deserialize, Serialize};

use crate::error::{MappingError, Result};
use crate::names::validate_key;

/// Mapping from component key to [`IdentityRecord`].
///
/// Iteration order is by key. Readers hold `&MappingTable`; the table has no
/// interior mutability, so shared references are safe to use from many
/// threads at once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, IdentityRecord>",
    into = "BTreeMap<String, IdentityRecord>"
)]
pub struct MappingTable {
    entries: BTreeMap<String, IdentityRecord>,
}

impl MappingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(key, record)` pairs, validating every entry.
    pub fn from_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, IdentityRecord)>,
        K: Into<String>,
    {
        let mut table = Self::new();
        for (key, record) in entries {
            table.insert(key, record)?;
        }
        Ok(table)
    }

    /// Look up the record registered under `key`.
    pub fn get(&self, key: &str) -> Result<&IdentityRecord> {
        self.entries
            .get(key)
            .ok_or_else(|| MappingError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Like [`get`](Self::get) but returns `None` for a missing key.
    pub fn lookup(&self, key: &str) -> Option<&IdentityRecord> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Register `record` under `key`.
    ///
    /// Fails if the key is invalid, already present, or if another key
    /// already carries the same identity. The table is unchanged on error.
    pub fn insert(&mut self, key: impl Into<String>, record: IdentityRecord) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        if self.entries.contains_key(&key) {
            return Err(MappingError::DuplicateKey { key });
        }

        if let Some((existing, _)) = self.entries.iter().find(|(_, r)| r.id() == record.id()) {
            return Err(MappingError::DuplicateIdentity {
                id: record.id(),
                existing: existing.clone(),
                key,
            });
        }

        tracing::debug!(key = %key, id = %record.id(), source = %record.source(), "registered mapping");
        self.entries.insert(key, record);
        Ok(())
    }

    /// Remove the entry for `key`, returning its record if it existed.
    pub fn remove(&mut self, key: &str) -> Option<IdentityRecord> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            tracing::debug!(key = %key, "removed mapping");
        }
        removed
    }

    /// Iterate over all `(key, record)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IdentityRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All entries whose implementation is `source`.
    pub fn records_for_source<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> impl Iterator<Item = (&'a str, &'a IdentityRecord)> + 'a {
        self.iter().filter(move |(_, r)| r.source() == source)
    }

    /// Build a transient identity → key view of the table.
    ///
    /// The view borrows the table and is rebuilt on every call; nothing is
    /// cached, so it always reflects the table's current contents.
    pub fn inverse(&self) -> HashMap<ComponentId, &str> {
        self.iter().map(|(k, r)| (r.id(), k)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, IdentityRecord>> for MappingTable {
    type Error = MappingError;

    fn try_from(entries: BTreeMap<String, IdentityRecord>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<MappingTable> for BTreeMap<String, IdentityRecord> {
    fn from(table: MappingTable) -> Self {
        table.entries
    }
}

impl<'a> IntoIterator for &'a MappingTable {
    type Item = (&'a String, &'a IdentityRecord);
    type IntoIter = std::collections::btree_map::Iter<'a, String, IdentityRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
