//! Store directories for the compreg component registry.
//!
//! A store directory holds one persisted artifact per component, named by
//! the component's stable identity. Its only job during resolution is to say
//! which identities exist; artifact bodies are read by tooling, never by the
//! resolver.
//!
//! # Storage Backends
//!
//! All backends implement the [`StoreDirectory`] trait:
//!
//! - [`FsStoreDirectory`] -- `<root>/<store>/<uuid>.json` on the local filesystem
//! - [`InMemoryStoreDirectory`] -- map-based directory for tests and embedding
//!
//! # Design Rules
//!
//! 1. Entries are written under the canonical identity rendering and matched by
//!    identity; extensions are ignored.
//! 2. A missing store is [`StoreError::StoreNotFound`], never an empty listing.
//! 3. Writes go to a temporary file first and are renamed into place.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod artifact;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use artifact::Artifact;
pub use error::{StoreError, StoreResult};
pub use fs::FsStoreDirectory;
pub use memory::InMemoryStoreDirectory;
pub use traits::{names_identity, validate_store_name, StoreDirectory};
