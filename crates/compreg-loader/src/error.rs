//! Error types for implementation loading.

use compreg_types::SourceRef;
use thiserror::Error;

/// Errors raised while loading or constructing an implementation.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No implementation is registered under this reference.
    #[error("no implementation registered for {reference}")]
    UnknownImplementation { reference: SourceRef },

    /// The implementation was found but refused to construct.
    #[error("failed to construct {reference}: {reason}")]
    Construction { reference: SourceRef, reason: String },

    /// An implementation is already registered under this reference.
    #[error("implementation already registered: {reference}")]
    DuplicateImplementation { reference: SourceRef },
}

impl LoadError {
    /// The implementation reference the error is about.
    pub fn reference(&self) -> &SourceRef {
        match self {
            Self::UnknownImplementation { reference }
            | Self::Construction { reference, .. }
            | Self::DuplicateImplementation { reference } => reference,
        }
    }
}

/// Convenience type alias for loader operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
