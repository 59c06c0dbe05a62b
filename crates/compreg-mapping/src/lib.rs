//! Mapping tables for the compreg component registry.
//!
//! A mapping table associates human-readable keys with the
//! [`IdentityRecord`](compreg_types::IdentityRecord) of a registered
//! component. It is the single source of truth for what is registered;
//! store directories only say what has been persisted.
//!
//! # Modules
//!
//! - [`error`]: Error types for mapping operations
//! - [`names`]: Key validation
//! - [`table`]: The [`MappingTable`] and its write-time invariants
//! - [`file`]: TOML/JSON [`MappingFile`] holding one table per store

pub mod error;
pub mod file;
pub mod names;
pub mod table;

pub use error::{MappingError, Result};
pub use file::{MappingFile, MappingFormat};
pub use names::validate_key;
pub use table::MappingTable;
