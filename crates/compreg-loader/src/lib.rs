//! Implementation loading for the compreg component registry.
//!
//! A mapping table names each component's implementation with a
//! [`SourceRef`](compreg_types::SourceRef). This crate turns such references
//! into constructors. Instead of reflective lookup, implementations are
//! registered into an [`ImplementationRegistry`] at startup and looked up by
//! reference when a component is instantiated.
//!
//! # Quick Start
//!
//! ```rust
//! use std::any::Any;
//! use compreg_loader::{Component, ComponentLoader, FromIdentity, ImplementationRegistry};
//! use compreg_types::{ComponentId, SourceRef};
//!
//! #[derive(Debug)]
//! struct LocalStore { id: ComponentId }
//!
//! impl Component for LocalStore {
//!     fn id(&self) -> ComponentId { self.id }
//!     fn kind(&self) -> &'static str { "artifact_store" }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! impl FromIdentity for LocalStore {
//!     fn from_identity(id: ComponentId) -> Self { Self { id } }
//! }
//!
//! let source = SourceRef::parse("stores.LocalStore").unwrap();
//! let mut registry = ImplementationRegistry::new();
//! registry.register_type::<LocalStore>(source.clone()).unwrap();
//!
//! let id = ComponentId::new();
//! let store = registry.construct(&source, id).unwrap();
//! assert_eq!(store.id(), id);
//! ```

pub mod component;
pub mod error;
pub mod registry;

pub use component::{Component, FromIdentity};
pub use error::{LoadError, LoadResult};
pub use registry::{ComponentFactory, ComponentLoader, ImplementationRegistry};
