//! The [`Component`] trait every loadable implementation satisfies.

use std::any::Any;
use std::fmt;

use compreg_types::ComponentId;

/// A live component instance.
///
/// Components are constructed from a stable identity and own nothing the
/// registry needs back: once handed to a caller, the registry keeps no
/// reference to them.
pub trait Component: fmt::Debug + Send + Sync + 'static {
    /// The stable identity this instance was constructed with.
    fn id(&self) -> ComponentId;

    /// Category of the component (e.g. "artifact_store", "orchestrator").
    fn kind(&self) -> &'static str;

    /// Access to the concrete type for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Component {
    /// Downcast to a concrete component type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns `true` if the concrete type is `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Components that can be built from nothing but their identity.
///
/// Implementing this lets a type be registered with
/// [`ImplementationRegistry::register_type`](crate::ImplementationRegistry::register_type).
pub trait FromIdentity: Component + Sized {
    fn from_identity(id: ComponentId) -> Self;
}
