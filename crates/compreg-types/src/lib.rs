//! Foundation types for the compreg component registry.
//!
//! This crate provides the identity and reference types shared by every
//! other compreg crate. Every other compreg crate depends on `compreg-types`.
//!
//! # Key Types
//!
//! - [`ComponentId`]: Stable 128-bit identity assigned once at component creation
//! - [`SourceRef`]: Implementation reference (`module.path.TypeName`), resolved lazily
//! - [`IdentityRecord`]: Immutable (identity, implementation reference) pair

pub mod error;
pub mod identity;
pub mod record;
pub mod source;

pub use error::TypeError;
pub use identity::ComponentId;
pub use record::IdentityRecord;
pub use source::SourceRef;
