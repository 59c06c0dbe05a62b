use std::path::PathBuf;

use compreg_types::ComponentId;

/// Errors from store directory operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named store has no backing directory.
    #[error("store not found: {store} ({})", path.display())]
    StoreNotFound { store: String, path: PathBuf },

    /// The store name cannot be used as a directory name.
    #[error("invalid store name {name:?}: {reason}")]
    InvalidStoreName { name: String, reason: String },

    /// A persisted artifact exists but cannot be decoded.
    #[error("corrupt artifact {id} in store {store}: {reason}")]
    CorruptArtifact {
        store: String,
        id: ComponentId,
        reason: String,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
