use std::path::PathBuf;

use compreg_loader::LoadError;
use compreg_mapping::MappingError;
use compreg_store::StoreError;
use compreg_types::ComponentId;
use thiserror::Error;

/// Errors surfaced by resolution and registration.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The requested key has no mapping table entry.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// No mapping table entry carries this identity.
    #[error("identity not registered: {id}")]
    IdentityNotRegistered { id: ComponentId },

    /// The implementation for `key` could not be loaded or constructed.
    #[error("cannot instantiate {key}: {error}")]
    ImplementationLoad {
        key: String,
        #[source]
        error: LoadError,
    },

    /// The named store has no backing directory.
    #[error("store not found: {store} ({})", path.display())]
    StoreNotFound { store: String, path: PathBuf },

    #[error("store error: {0}")]
    Store(#[source] StoreError),

    #[error("mapping error: {0}")]
    Mapping(#[source] MappingError),
}

impl From<StoreError> for ResolveError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::StoreNotFound { store, path } => Self::StoreNotFound { store, path },
            other => Self::Store(other),
        }
    }
}

impl From<MappingError> for ResolveError {
    fn from(e: MappingError) -> Self {
        match e {
            MappingError::KeyNotFound { key } => Self::KeyNotFound { key },
            other => Self::Mapping(other),
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_store_is_lifted_to_top_level() {
        let err: ResolveError = StoreError::StoreNotFound {
            store: "orchestrators".into(),
            path: "/tmp/orchestrators".into(),
        }
        .into();
        assert!(matches!(err, ResolveError::StoreNotFound { ref store, .. } if store == "orchestrators"));
    }

    #[test]
    fn missing_key_is_lifted_to_top_level() {
        let err: ResolveError = MappingError::KeyNotFound { key: "ghost".into() }.into();
        assert!(matches!(err, ResolveError::KeyNotFound { ref key } if key == "ghost"));

        let err: ResolveError = MappingError::DuplicateKey { key: "alpha".into() }.into();
        assert!(matches!(err, ResolveError::Mapping(MappingError::DuplicateKey { .. })));
    }
}
