use std::collections::BTreeMap;
use std::sync::RwLock;

use compreg_types::ComponentId;

use crate::artifact::Artifact;
use crate::error::{StoreError, StoreResult};
use crate::traits::{names_identity, validate_store_name, StoreDirectory};

/// An entry in an in-memory store: either a decoded artifact or a bare name
/// written with [`InMemoryStoreDirectory::insert_raw_entry`].
#[derive(Clone, Debug)]
enum Entry {
    Artifact(Artifact),
    Raw,
}

/// In-memory store directory.
///
/// Intended for tests and embedding. Stores are held behind a `RwLock`;
/// artifacts are cloned on read/write.
pub struct InMemoryStoreDirectory {
    stores: RwLock<BTreeMap<String, BTreeMap<String, Entry>>>,
}

impl InMemoryStoreDirectory {
    /// Create a directory with no stores.
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create `store` if it does not exist yet.
    pub fn create_store(&self, store: &str) -> StoreResult<()> {
        validate_store_name(store)?;
        let mut stores = self.stores.write().map_err(|_| StoreError::Poisoned)?;
        stores.entry(store.to_string()).or_default();
        Ok(())
    }

    /// Add an entry by name without an artifact body.
    ///
    /// Useful for simulating stray or hand-written files: `name` is listed
    /// as-is, whether or not it parses as an identity.
    pub fn insert_raw_entry(&self, store: &str, name: &str) -> StoreResult<()> {
        validate_store_name(store)?;
        let mut stores = self.stores.write().map_err(|_| StoreError::Poisoned)?;
        stores
            .entry(store.to_string())
            .or_default()
            .insert(name.to_string(), Entry::Raw);
        Ok(())
    }

    /// Total number of entries across all stores.
    pub fn len(&self) -> usize {
        self.stores
            .read()
            .map(|s| s.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if no store holds any entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStoreDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreDirectory for InMemoryStoreDirectory {
    fn list_persisted_identities(&self, store: &str) -> StoreResult<Vec<String>> {
        let stores = self.stores.read().map_err(|_| StoreError::Poisoned)?;
        let entries = stores.get(store).ok_or_else(|| StoreError::StoreNotFound {
            store: store.to_string(),
            path: store.into(),
        })?;
        Ok(entries.keys().cloned().collect())
    }

    fn persist(&self, store: &str, artifact: &Artifact) -> StoreResult<()> {
        validate_store_name(store)?;
        let mut stores = self.stores.write().map_err(|_| StoreError::Poisoned)?;
        stores
            .entry(store.to_string())
            .or_default()
            .insert(artifact.uuid.canonical(), Entry::Artifact(artifact.clone()));
        Ok(())
    }

    fn read_artifact(&self, store: &str, id: &ComponentId) -> StoreResult<Option<Artifact>> {
        let stores = self.stores.read().map_err(|_| StoreError::Poisoned)?;
        let entry = stores.get(store).and_then(|s| {
            s.get(&id.canonical())
                .or_else(|| s.iter().find(|(name, _)| names_identity(name, id)).map(|(_, e)| e))
        });
        match entry {
            None => Ok(None),
            Some(Entry::Artifact(a)) => Ok(Some(a.clone())),
            Some(Entry::Raw) => Err(StoreError::CorruptArtifact {
                store: store.to_string(),
                id: *id,
                reason: "entry has no artifact body".into(),
            }),
        }
    }

    fn remove(&self, store: &str, id: &ComponentId) -> StoreResult<bool> {
        let mut stores = self.stores.write().map_err(|_| StoreError::Poisoned)?;
        let Some(entries) = stores.get_mut(store) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|name, _| !names_identity(name, id));
        Ok(entries.len() != before)
    }

    fn stores(&self) -> StoreResult<Vec<String>> {
        let stores = self.stores.read().map_err(|_| StoreError::Poisoned)?;
        Ok(stores.keys().cloned().collect())
    }
}

impl std::fmt::Debug for InMemoryStoreDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStoreDirectory")
            .field("entry_count", &self.len())
            .finish()
    }
}
