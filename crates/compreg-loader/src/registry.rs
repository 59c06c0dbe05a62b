//! Implementation lookup: reference string to constructor.
//!
//! Implementations are registered explicitly at startup. A reference that was
//! never registered is a load error at instantiation time, just as a missing
//! module or type would be.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use compreg_types::{ComponentId, SourceRef};

use crate::component::{Component, FromIdentity};
use crate::error::{LoadError, LoadResult};

/// Constructor for one implementation.
///
/// Called with the component's stable identity; returns a fully initialized
/// component or a construction error.
pub type ComponentFactory =
    Arc<dyn Fn(ComponentId) -> LoadResult<Box<dyn Component>> + Send + Sync>;

/// Resolves implementation references to constructors.
///
/// Loading may run implementation setup code; callers should expect that
/// side effect on every `load_type` call.
pub trait ComponentLoader: Send + Sync {
    /// Find the constructor for `reference`.
    fn load_type(&self, reference: &SourceRef) -> LoadResult<ComponentFactory>;

    /// Load `reference` and construct an instance with `id`.
    fn construct(&self, reference: &SourceRef, id: ComponentId) -> LoadResult<Box<dyn Component>> {
        let factory = self.load_type(reference)?;
        factory(id)
    }
}

/// A closed table of implementations, filled at process startup.
#[derive(Clone, Default)]
pub struct ImplementationRegistry {
    factories: BTreeMap<SourceRef, ComponentFactory>,
}

impl ImplementationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `reference`.
    pub fn register(&mut self, reference: SourceRef, factory: ComponentFactory) -> LoadResult<()> {
        if self.factories.contains_key(&reference) {
            return Err(LoadError::DuplicateImplementation { reference });
        }
        tracing::debug!(source = %reference, "registered implementation");
        self.factories.insert(reference, factory);
        Ok(())
    }

    /// Register a fallible constructor closure.
    pub fn register_fn<F>(&mut self, reference: SourceRef, f: F) -> LoadResult<()>
    where
        F: Fn(ComponentId) -> LoadResult<Box<dyn Component>> + Send + Sync + 'static,
    {
        self.register(reference, Arc::new(f))
    }

    /// Register a type that builds from its identity alone.
    pub fn register_type<T: FromIdentity>(&mut self, reference: SourceRef) -> LoadResult<()> {
        self.register_fn(reference, |id| Ok(Box::new(T::from_identity(id)) as Box<dyn Component>))
    }

    pub fn contains(&self, reference: &SourceRef) -> bool {
        self.factories.contains_key(reference)
    }

    /// All registered references, sorted.
    pub fn sources(&self) -> impl Iterator<Item = &SourceRef> {
        self.factories.keys()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ComponentLoader for ImplementationRegistry {
    fn load_type(&self, reference: &SourceRef) -> LoadResult<ComponentFactory> {
        self.factories
            .get(reference)
            .cloned()
            .ok_or_else(|| LoadError::UnknownImplementation {
                reference: reference.clone(),
            })
    }
}

impl fmt::Debug for ImplementationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationRegistry")
            .field("sources", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
