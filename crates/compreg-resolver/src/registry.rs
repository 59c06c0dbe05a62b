//! The [`Registry`] facade: mapping tables, a store directory, and an
//! implementation registry held together.
//!
//! Resolution goes through [`Resolver`]; the facade adds the write side
//! (registering and deregistering components) and keeps the mapping tables
//! and the store directory in step while doing so.

use compreg_loader::{Component, ComponentLoader, ImplementationRegistry, LoadError};
use compreg_mapping::{MappingFile, MappingTable};
use compreg_store::{validate_store_name, Artifact, StoreDirectory};
use compreg_types::{ComponentId, IdentityRecord, SourceRef};

use crate::error::{ResolveError, ResolveResult};
use crate::listing::{StoreListing, StoreReport};
use crate::resolver::Resolver;

/// Component properties stored alongside the identity in an artifact.
pub type Properties = serde_json::Map<String, serde_json::Value>;

pub struct Registry<S> {
    mappings: MappingFile,
    store: S,
    loader: ImplementationRegistry,
    empty: MappingTable,
}

impl<S: StoreDirectory> Registry<S> {
    pub fn new(mappings: MappingFile, store: S, loader: ImplementationRegistry) -> Self {
        Self {
            mappings,
            store,
            loader,
            empty: MappingTable::new(),
        }
    }

    pub fn mappings(&self) -> &MappingFile {
        &self.mappings
    }

    pub fn into_mappings(self) -> MappingFile {
        self.mappings
    }

    pub fn store_directory(&self) -> &S {
        &self.store
    }

    pub fn loader(&self) -> &ImplementationRegistry {
        &self.loader
    }

    /// Mapping table for `store`; empty if nothing was ever registered there.
    pub fn table(&self, store: &str) -> &MappingTable {
        self.mappings.table(store).unwrap_or(&self.empty)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.loader, &self.store)
    }

    pub fn instantiate(&self, store: &str, key: &str) -> ResolveResult<Box<dyn Component>> {
        self.resolver().instantiate(key, self.table(store))
    }

    pub fn key_for_identity(&self, store: &str, id: &ComponentId) -> ResolveResult<&str> {
        self.resolver().key_for_identity(id, self.table(store))
    }

    pub fn enumerate(&self, store: &str) -> ResolveResult<StoreListing> {
        self.resolver().enumerate_store(store, self.table(store))
    }

    pub fn check(&self, store: &str) -> ResolveResult<StoreReport> {
        self.resolver().check_store(store, self.table(store))
    }

    /// Record and persisted artifact for `key`, if the artifact exists.
    pub fn describe(
        &self,
        store: &str,
        key: &str,
    ) -> ResolveResult<(IdentityRecord, Option<Artifact>)> {
        let record = self.table(store).get(key)?.clone();
        let artifact = self.store.read_artifact(store, &record.id())?;
        Ok((record, artifact))
    }

    /// Register a new component under `key` in `store`.
    ///
    /// Assigns a fresh identity, checks that `source` constructs, adds the
    /// mapping entry, and persists the artifact. If persisting fails, the
    /// mapping entry is removed again.
    pub fn register(
        &mut self,
        store: &str,
        key: &str,
        source: SourceRef,
        properties: Properties,
    ) -> ResolveResult<IdentityRecord> {
        validate_store_name(store)?;

        let record = IdentityRecord::fresh(source);
        let built = self
            .loader
            .construct(record.source(), record.id())
            .map_err(|error| ResolveError::ImplementationLoad {
                key: key.to_string(),
                error,
            })?;
        if built.id() != record.id() {
            return Err(ResolveError::ImplementationLoad {
                key: key.to_string(),
                error: LoadError::Construction {
                    reference: record.source().clone(),
                    reason: format!("constructed component reports identity {}", built.id()),
                },
            });
        }

        self.mappings.table_mut(store).insert(key, record.clone())?;

        let mut artifact = Artifact::for_record(&record);
        artifact.properties = properties;
        if let Err(e) = self.store.persist(store, &artifact) {
            self.mappings.table_mut(store).remove(key);
            return Err(e.into());
        }

        tracing::info!(store, key, id = %record.id(), source = %record.source(), "registered component");
        Ok(record)
    }

    /// Remove `key` from `store`: deletes the artifact, then the mapping entry.
    ///
    /// A component whose artifact is already gone is still deregistered.
    pub fn deregister(&mut self, store: &str, key: &str) -> ResolveResult<IdentityRecord> {
        let id = self.table(store).get(key)?.id();

        let existed = self.store.remove(store, &id)?;
        if !existed {
            tracing::warn!(store, key, id = %id, "deregistering component with no persisted artifact");
        }

        let record = self
            .mappings
            .table_mut(store)
            .remove(key)
            .ok_or_else(|| ResolveError::KeyNotFound {
                key: key.to_string(),
            })?;

        tracing::info!(store, key, id = %id, "deregistered component");
        Ok(record)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("stores", &self.mappings.stores.keys().collect::<Vec<_>>())
            .field("store_directory", &self.store)
            .field("loader", &self.loader)
            .finish()
    }
}
