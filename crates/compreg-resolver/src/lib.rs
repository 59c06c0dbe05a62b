//! Resolution for the compreg component registry.
//!
//! Callers hold a [`MappingTable`](compreg_mapping::MappingTable) per store
//! and ask a [`Resolver`] to:
//!
//! - find the key registered for an identity ([`Resolver::key_for_identity`]),
//! - instantiate the component behind a key ([`Resolver::instantiate`]),
//! - enumerate the components of a store that are both registered and
//!   persisted ([`Resolver::enumerate_store`]).
//!
//! The resolver never reads artifact contents. It uses the store directory
//! only to learn which identities exist, and the mapping table to go from
//! identity to key to implementation to live object.
//!
//! Entries that exist on one side only are drift. During enumeration,
//! persisted entries that cannot be resolved are skipped and reported as
//! [`Drift`] in the returned [`StoreListing`] instead of failing the call.
//!
//! [`Registry`] bundles tables, a store directory, and an implementation
//! registry, and adds registration on top.

pub mod error;
pub mod listing;
pub mod registry;
pub mod resolver;

pub use error::{ResolveError, ResolveResult};
pub use listing::{Drift, StoreListing, StoreReport};
pub use registry::{Properties, Registry};
pub use resolver::{key_for_identity, Resolver};

// Re-export key types
pub use compreg_loader::{Component, ComponentLoader, FromIdentity, ImplementationRegistry};
pub use compreg_mapping::{MappingFile, MappingTable};
pub use compreg_store::{Artifact, FsStoreDirectory, InMemoryStoreDirectory, StoreDirectory};
pub use compreg_types::{ComponentId, IdentityRecord, SourceRef};
