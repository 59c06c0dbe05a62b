//! Error types for mapping table operations.

use std::path::PathBuf;

use compreg_types::ComponentId;
use thiserror::Error;

/// Errors that can occur while building, querying, or loading a mapping table.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The key has no entry in the table.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// A record is already registered under this key.
    #[error("key already registered: {key}")]
    DuplicateKey { key: String },

    /// Another key already carries this identity.
    #[error("identity {id} already registered under key {existing:?}, refusing {key:?}")]
    DuplicateIdentity {
        id: ComponentId,
        existing: String,
        key: String,
    },

    /// The key is not a valid component name.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The mapping file extension is neither `.toml` nor `.json`.
    #[error("unsupported mapping file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading or writing a mapping file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;
