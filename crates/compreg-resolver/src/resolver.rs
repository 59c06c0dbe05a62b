//! Key, identity, and store resolution.
//!
//! The [`Resolver`] turns declarative mapping entries into live components.
//! It borrows its collaborators (a [`ComponentLoader`] and a
//! [`StoreDirectory`]) and takes the mapping table by shared reference on
//! every call. It keeps no state between calls: inverse maps and partial
//! results live only for the duration of one call, so results always reflect
//! the table and the directory as they are at invocation time.

use std::collections::{BTreeMap, HashSet};

use compreg_loader::{Component, ComponentLoader, LoadError};
use compreg_mapping::MappingTable;
use compreg_store::StoreDirectory;
use compreg_types::{ComponentId, IdentityRecord};

use crate::error::{ResolveError, ResolveResult};
use crate::listing::{Drift, StoreListing, StoreReport};

/// Find the key whose record carries `id`.
///
/// Builds a transient inverse of `table` (one pass over every entry). The
/// table guarantees identities are unique, so at most one key matches.
pub fn key_for_identity<'t>(id: &ComponentId, table: &'t MappingTable) -> ResolveResult<&'t str> {
    table
        .inverse()
        .get(id)
        .copied()
        .ok_or(ResolveError::IdentityNotRegistered { id: *id })
}

/// Resolves mapping entries against a loader and a store directory.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    loader: &'a dyn ComponentLoader,
    store: &'a dyn StoreDirectory,
}

impl<'a> Resolver<'a> {
    pub fn new(loader: &'a dyn ComponentLoader, store: &'a dyn StoreDirectory) -> Self {
        Self { loader, store }
    }

    /// See [`key_for_identity`].
    pub fn key_for_identity<'t>(
        &self,
        id: &ComponentId,
        table: &'t MappingTable,
    ) -> ResolveResult<&'t str> {
        key_for_identity(id, table)
    }

    /// Instantiate the component registered under `key`.
    ///
    /// Every call constructs a new instance; the caller owns it. A missing key
    /// fails before the loader is consulted.
    pub fn instantiate(
        &self,
        key: &str,
        table: &MappingTable,
    ) -> ResolveResult<Box<dyn Component>> {
        let record = table.get(key)?;
        self.construct(key, record)
    }

    /// Instantiate the component carrying `id`.
    ///
    /// An unregistered identity is fatal here, unlike during enumeration.
    pub fn instantiate_identity(
        &self,
        id: &ComponentId,
        table: &MappingTable,
    ) -> ResolveResult<(String, Box<dyn Component>)> {
        let key = key_for_identity(id, table)?;
        let component = self.instantiate(key, table)?;
        Ok((key.to_string(), component))
    }

    /// Live components of `store`: those both registered in `table` and
    /// persisted in the store directory.
    ///
    /// Registered components that were never persisted are left out without
    /// comment. Store entries that cannot be resolved (unregistered identity,
    /// malformed name, failed load) are skipped, logged, and collected in
    /// [`StoreListing::drift`]. A missing store fails the whole call with
    /// [`ResolveError::StoreNotFound`].
    pub fn enumerate_store(
        &self,
        store: &str,
        table: &MappingTable,
    ) -> ResolveResult<StoreListing> {
        let entries = self.store.list_persisted_identities(store)?;
        let mut listing = StoreListing::new(store);

        let inverse = table.inverse();
        let mut seen = HashSet::new();
        for (entry, id) in parse_entries(&entries, &mut listing.drift) {
            if !seen.insert(id) {
                tracing::warn!(store, entry, id = %id, "duplicate store entry, skipping");
                listing.drift.push(Drift::DuplicateEntry {
                    entry: entry.to_string(),
                    id,
                });
                continue;
            }

            let Some(&key) = inverse.get(&id) else {
                tracing::warn!(store, id = %id, "persisted component is not registered, skipping");
                listing.drift.push(Drift::Unregistered { id });
                continue;
            };

            let record = table.get(key)?;
            match self.construct(key, record) {
                Ok(component) => {
                    listing.components.insert(key.to_string(), component);
                }
                Err(ResolveError::ImplementationLoad { error, .. }) => {
                    tracing::warn!(store, key, id = %id, error = %error, "component failed to load, skipping");
                    listing.drift.push(Drift::LoadFailed {
                        key: key.to_string(),
                        id,
                        reason: error.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        tracing::debug!(
            store,
            components = listing.components.len(),
            drift = listing.drift.len(),
            "enumerated store"
        );
        Ok(listing)
    }

    /// Compare `table` with the store directory without loading anything.
    ///
    /// Reports the same drift as [`enumerate_store`](Self::enumerate_store)
    /// except load failures, and additionally lists registered keys that are
    /// not persisted.
    pub fn check_store(&self, store: &str, table: &MappingTable) -> ResolveResult<StoreReport> {
        let entries = self.store.list_persisted_identities(store)?;
        let mut drift = Vec::new();
        let inverse = table.inverse();

        let mut consistent = BTreeMap::new();
        let mut seen = HashSet::new();
        for (entry, id) in parse_entries(&entries, &mut drift) {
            if !seen.insert(id) {
                drift.push(Drift::DuplicateEntry {
                    entry: entry.to_string(),
                    id,
                });
                continue;
            }
            match inverse.get(&id) {
                None => drift.push(Drift::Unregistered { id }),
                Some(&key) => {
                    consistent.insert(key.to_string(), id);
                }
            }
        }

        for (key, record) in table.iter() {
            if !consistent.contains_key(key) {
                drift.push(Drift::NotPersisted {
                    key: key.to_string(),
                    id: record.id(),
                });
            }
        }

        Ok(StoreReport {
            store: store.to_string(),
            consistent: consistent.into_iter().collect(),
            drift,
        })
    }

    fn construct(&self, key: &str, record: &IdentityRecord) -> ResolveResult<Box<dyn Component>> {
        let load_error = |error: LoadError| ResolveError::ImplementationLoad {
            key: key.to_string(),
            error,
        };

        let component = self
            .loader
            .construct(record.source(), record.id())
            .map_err(load_error)?;

        if component.id() != record.id() {
            return Err(load_error(LoadError::Construction {
                reference: record.source().clone(),
                reason: format!(
                    "constructed component reports identity {}, expected {}",
                    component.id(),
                    record.id()
                ),
            }));
        }

        tracing::debug!(key, id = %record.id(), source = %record.source(), "instantiated component");
        Ok(component)
    }
}

/// Parse store entry names into identities, recording malformed names.
fn parse_entries<'e>(
    entries: &'e [String],
    drift: &mut Vec<Drift>,
) -> Vec<(&'e str, ComponentId)> {
    let mut parsed = Vec::with_capacity(entries.len());
    for entry in entries {
        match ComponentId::parse(entry) {
            Ok(id) => parsed.push((entry.as_str(), id)),
            Err(e) => {
                tracing::warn!(entry = %entry, "store entry is not a component identity, skipping");
                drift.push(Drift::MalformedEntry {
                    entry: entry.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    parsed
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use compreg_loader::{ComponentFactory, FromIdentity, ImplementationRegistry, LoadResult};
    use compreg_store::{Artifact, InMemoryStoreDirectory, StoreResult};
    use compreg_types::SourceRef;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Foo {
        id: ComponentId,
    }

    impl Component for Foo {
        fn id(&self) -> ComponentId {
            self.id
        }
        fn kind(&self) -> &'static str {
            "foo"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl FromIdentity for Foo {
        fn from_identity(id: ComponentId) -> Self {
            Self { id }
        }
    }

    #[derive(Debug)]
    struct Bar {
        id: ComponentId,
    }

    impl Component for Bar {
        fn id(&self) -> ComponentId {
            self.id
        }
        fn kind(&self) -> &'static str {
            "bar"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl FromIdentity for Bar {
        fn from_identity(id: ComponentId) -> Self {
            Self { id }
        }
    }

    /// Loader that counts every lookup.
    struct CountingLoader {
        inner: ImplementationRegistry,
        calls: AtomicUsize,
    }

    impl ComponentLoader for CountingLoader {
        fn load_type(&self, reference: &SourceRef) -> LoadResult<ComponentFactory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.load_type(reference)
        }
    }

    /// Store directory that counts every listing.
    struct CountingStore {
        inner: InMemoryStoreDirectory,
        calls: AtomicUsize,
    }

    impl StoreDirectory for CountingStore {
        fn list_persisted_identities(&self, store: &str) -> StoreResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_persisted_identities(store)
        }
        fn persist(&self, store: &str, artifact: &Artifact) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.persist(store, artifact)
        }
        fn read_artifact(&self, store: &str, id: &ComponentId) -> StoreResult<Option<Artifact>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.read_artifact(store, id)
        }
        fn remove(&self, store: &str, id: &ComponentId) -> StoreResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.remove(store, id)
        }
        fn stores(&self) -> StoreResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.stores()
        }
    }

    const STORE: &str = "artifact_stores";

    fn id(n: u128) -> ComponentId {
        ComponentId::from_uuid(uuid::Uuid::from_u128(n))
    }

    fn src(s: &str) -> SourceRef {
        SourceRef::parse(s).unwrap()
    }

    fn loader() -> ImplementationRegistry {
        let mut registry = ImplementationRegistry::new();
        registry.register_type::<Foo>(src("pkg.Foo")).unwrap();
        registry.register_type::<Bar>(src("pkg.Bar")).unwrap();
        registry
    }

    /// `{"alpha": (U1, pkg.Foo), "beta": (U2, pkg.Bar)}`
    fn table() -> MappingTable {
        MappingTable::from_entries([
            ("alpha", IdentityRecord::new(id(1), src("pkg.Foo"))),
            ("beta", IdentityRecord::new(id(2), src("pkg.Bar"))),
        ])
        .unwrap()
    }

    fn store_with(ids: &[ComponentId]) -> InMemoryStoreDirectory {
        let dir = InMemoryStoreDirectory::new();
        dir.create_store(STORE).unwrap();
        for id in ids {
            dir.insert_raw_entry(STORE, &id.canonical()).unwrap();
        }
        dir
    }

    // -----------------------------------------------------------------------
    // Identity -> key
    // -----------------------------------------------------------------------

    #[test]
    fn key_for_registered_identity() {
        let table = table();
        assert_eq!(key_for_identity(&id(2), &table).unwrap(), "beta");
    }

    #[test]
    fn unregistered_identity_fails() {
        let err = key_for_identity(&id(99), &table()).unwrap_err();
        assert!(matches!(err, ResolveError::IdentityNotRegistered { id: missing } if missing == id(99)));
    }

    #[test]
    fn key_lookup_on_empty_table() {
        let err = key_for_identity(&id(1), &MappingTable::new()).unwrap_err();
        assert!(matches!(err, ResolveError::IdentityNotRegistered { .. }));
    }

    // -----------------------------------------------------------------------
    // Instantiation
    // -----------------------------------------------------------------------

    #[test]
    fn instantiate_builds_named_type() {
        let (loader, store) = (loader(), store_with(&[]));
        let resolver = Resolver::new(&loader, &store);

        let component = resolver.instantiate("beta", &table()).unwrap();
        assert!(component.is::<Bar>());
        assert_eq!(component.id(), id(2));
    }

    #[test]
    fn instantiate_twice_yields_distinct_objects_with_same_identity() {
        let (loader, store) = (loader(), store_with(&[]));
        let resolver = Resolver::new(&loader, &store);
        let table = table();

        let a = resolver.instantiate("alpha", &table).unwrap();
        let b = resolver.instantiate("alpha", &table).unwrap();
        assert_eq!(a.id(), b.id());
        assert!(!std::ptr::eq(
            a.as_any() as *const dyn Any as *const u8,
            b.as_any() as *const dyn Any as *const u8,
        ));
    }

    #[test]
    fn missing_key_touches_neither_loader_nor_store() {
        let loader = CountingLoader {
            inner: loader(),
            calls: AtomicUsize::new(0),
        };
        let store = CountingStore {
            inner: store_with(&[id(1)]),
            calls: AtomicUsize::new(0),
        };
        let resolver = Resolver::new(&loader, &store);

        let err = resolver.instantiate("ghost", &table()).unwrap_err();
        assert!(matches!(err, ResolveError::KeyNotFound { ref key } if key == "ghost"));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_implementation_is_load_error() {
        let (loader, store) = (loader(), store_with(&[]));
        let resolver = Resolver::new(&loader, &store);
        let table =
            MappingTable::from_entries([("gamma", IdentityRecord::new(id(3), src("pkg.Missing")))])
                .unwrap();

        let err = resolver.instantiate("gamma", &table).unwrap_err();
        match err {
            ResolveError::ImplementationLoad { key, error } => {
                assert_eq!(key, "gamma");
                assert!(matches!(error, LoadError::UnknownImplementation { .. }));
            }
            other => panic!("expected ImplementationLoad, got: {other}"),
        }
    }

    #[test]
    fn factory_reporting_wrong_identity_is_rejected() {
        let mut registry = loader();
        registry
            .register_fn(src("pkg.Liar"), |_| {
                Ok(Box::new(Foo { id: id(42) }) as Box<dyn Component>)
            })
            .unwrap();
        let store = store_with(&[]);
        let resolver = Resolver::new(&registry, &store);
        let table =
            MappingTable::from_entries([("liar", IdentityRecord::new(id(7), src("pkg.Liar")))])
                .unwrap();

        let err = resolver.instantiate("liar", &table).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ImplementationLoad {
                error: LoadError::Construction { .. },
                ..
            }
        ));
    }

    #[test]
    fn instantiate_by_identity() {
        let (loader, store) = (loader(), store_with(&[]));
        let resolver = Resolver::new(&loader, &store);

        let (key, component) = resolver.instantiate_identity(&id(1), &table()).unwrap();
        assert_eq!(key, "alpha");
        assert!(component.is::<Foo>());

        let err = resolver.instantiate_identity(&id(5), &table()).unwrap_err();
        assert!(matches!(err, ResolveError::IdentityNotRegistered { .. }));
    }

    // -----------------------------------------------------------------------
    // Store enumeration
    // -----------------------------------------------------------------------

    #[test]
    fn enumerate_returns_registered_and_persisted_only() {
        let (loader, store) = (loader(), store_with(&[id(1)]));
        let resolver = Resolver::new(&loader, &store);

        let listing = resolver.enumerate_store(STORE, &table()).unwrap();
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["alpha"]);
        let alpha = listing.get("alpha").unwrap();
        assert_eq!(alpha.downcast_ref::<Foo>().unwrap().id, id(1));
        assert!(listing.is_consistent());
    }

    #[test]
    fn enumerate_reports_unregistered_as_drift() {
        let table = MappingTable::from_entries([
            ("a", IdentityRecord::new(id(1), src("pkg.Foo"))),
            ("b", IdentityRecord::new(id(2), src("pkg.Bar"))),
        ])
        .unwrap();
        let (loader, store) = (loader(), store_with(&[id(1), id(2), id(3)]));
        let resolver = Resolver::new(&loader, &store);

        let listing = resolver.enumerate_store(STORE, &table).unwrap();
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(listing.drift, vec![Drift::Unregistered { id: id(3) }]);
    }

    #[test]
    fn enumerate_empty_store_is_empty() {
        let (loader, store) = (loader(), store_with(&[]));
        let resolver = Resolver::new(&loader, &store);

        let listing = resolver.enumerate_store(STORE, &table()).unwrap();
        assert!(listing.is_empty());
        assert!(listing.is_consistent());
    }

    #[test]
    fn enumerate_missing_store_fails() {
        let loader = loader();
        let store = InMemoryStoreDirectory::new();
        let resolver = Resolver::new(&loader, &store);

        let err = resolver.enumerate_store("orchestrators", &table()).unwrap_err();
        assert!(matches!(err, ResolveError::StoreNotFound { ref store, .. } if store == "orchestrators"));
    }

    #[test]
    fn enumerate_skips_malformed_entries() {
        let (loader, store) = (loader(), store_with(&[id(2)]));
        store.insert_raw_entry(STORE, "README").unwrap();
        let resolver = Resolver::new(&loader, &store);

        let listing = resolver.enumerate_store(STORE, &table()).unwrap();
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["beta"]);
        assert!(matches!(
            listing.drift.as_slice(),
            [Drift::MalformedEntry { entry, .. }] if entry == "README"
        ));
    }

    #[test]
    fn enumerate_skips_failed_loads() {
        let table = MappingTable::from_entries([
            ("alpha", IdentityRecord::new(id(1), src("pkg.Foo"))),
            ("gamma", IdentityRecord::new(id(3), src("pkg.Missing"))),
        ])
        .unwrap();
        let (loader, store) = (loader(), store_with(&[id(1), id(3)]));
        let resolver = Resolver::new(&loader, &store);

        let listing = resolver.enumerate_store(STORE, &table).unwrap();
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["alpha"]);
        assert!(matches!(
            listing.drift.as_slice(),
            [Drift::LoadFailed { key, .. }] if key == "gamma"
        ));
    }

    #[test]
    fn enumerate_flags_duplicate_renderings() {
        let (loader, store) = (loader(), store_with(&[id(1)]));
        store
            .insert_raw_entry(STORE, &id(1).as_uuid().simple().to_string())
            .unwrap();
        let resolver = Resolver::new(&loader, &store);

        let listing = resolver.enumerate_store(STORE, &table()).unwrap();
        assert_eq!(listing.len(), 1);
        assert!(matches!(
            listing.drift.as_slice(),
            [Drift::DuplicateEntry { id: dup, .. }] if *dup == id(1)
        ));
    }

    #[test]
    fn check_store_flags_duplicate_renderings_once() {
        let (loader, store) = (loader(), store_with(&[id(1), id(2), id(3)]));
        store
            .insert_raw_entry(STORE, &id(3).as_uuid().simple().to_string())
            .unwrap();
        let resolver = Resolver::new(&loader, &store);

        let report = resolver.check_store(STORE, &table()).unwrap();
        assert_eq!(report.consistent.len(), 2);
        assert_eq!(report.drift.len(), 2);
        assert!(report.drift.contains(&Drift::Unregistered { id: id(3) }));
        assert!(report
            .drift
            .iter()
            .any(|d| matches!(d, Drift::DuplicateEntry { id: dup, .. } if *dup == id(3))));
    }

    #[test]
    fn enumerate_with_empty_table_reports_everything_as_drift() {
        let (loader, store) = (loader(), store_with(&[id(1), id(2)]));
        let resolver = Resolver::new(&loader, &store);

        let listing = resolver.enumerate_store(STORE, &MappingTable::new()).unwrap();
        assert!(listing.is_empty());
        assert_eq!(listing.drift.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Store check
    // -----------------------------------------------------------------------

    #[test]
    fn check_store_reports_both_directions() {
        let (loader, store) = (loader(), store_with(&[id(1), id(3)]));
        let resolver = Resolver::new(&loader, &store);

        let report = resolver.check_store(STORE, &table()).unwrap();
        assert_eq!(report.consistent, vec![("alpha".to_string(), id(1))]);
        assert!(report.drift.contains(&Drift::Unregistered { id: id(3) }));
        assert!(report.drift.contains(&Drift::NotPersisted {
            key: "beta".into(),
            id: id(2)
        }));
        assert!(!report.is_consistent());
    }

    #[test]
    fn check_store_never_loads() {
        let loader = CountingLoader {
            inner: ImplementationRegistry::new(),
            calls: AtomicUsize::new(0),
        };
        let store = store_with(&[id(1), id(2)]);
        let resolver = Resolver::new(&loader, &store);

        let report = resolver.check_store(STORE, &table()).unwrap();
        assert!(report.is_consistent());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resolver_is_usable_across_threads() {
        let (loader, store) = (loader(), store_with(&[id(1), id(2)]));
        let table = table();
        let resolver = Resolver::new(&loader, &store);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let listing = resolver.enumerate_store(STORE, &table).unwrap();
                    assert_eq!(listing.len(), 2);
                });
            }
        });
    }

    proptest! {
        #[test]
        fn key_identity_roundtrip(ids in proptest::collection::hash_set(any::<u128>(), 1..16)) {
            let table = MappingTable::from_entries(
                ids.iter().enumerate().map(|(i, n)| {
                    let source = if i % 2 == 0 { "pkg.Foo" } else { "pkg.Bar" };
                    (format!("component-{i}"), IdentityRecord::new(id(*n), src(source)))
                }),
            )
            .unwrap();
            let (loader, store) = (loader(), store_with(&[]));
            let resolver = Resolver::new(&loader, &store);

            for key in table.keys() {
                let component = resolver.instantiate(key, &table).unwrap();
                prop_assert_eq!(resolver.key_for_identity(&component.id(), &table).unwrap(), key);
            }
        }

        #[test]
        fn enumeration_is_the_intersection(
            registered in proptest::collection::btree_set(0u128..32, 0..16),
            persisted in proptest::collection::btree_set(0u128..32, 0..16),
        ) {
            let table = MappingTable::from_entries(
                registered
                    .iter()
                    .map(|n| (format!("c{n}"), IdentityRecord::new(id(*n), src("pkg.Foo")))),
            )
            .unwrap();
            let persisted_ids: Vec<ComponentId> = persisted.iter().map(|n| id(*n)).collect();
            let (loader, store) = (loader(), store_with(&persisted_ids));
            let resolver = Resolver::new(&loader, &store);

            let listing = resolver.enumerate_store(STORE, &table).unwrap();
            let expected: Vec<String> = registered
                .intersection(&persisted)
                .map(|n| format!("c{n}"))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            prop_assert_eq!(listing.keys().map(String::from).collect::<Vec<_>>(), expected);
            prop_assert_eq!(listing.drift.len(), persisted.difference(&registered).count());
        }
    }
}
