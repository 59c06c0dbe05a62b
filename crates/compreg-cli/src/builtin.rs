//! Implementations shipped with the CLI.
//!
//! These are the component types a mapping file can name out of the box.
//! Each builds from its identity alone; its settings live in the persisted
//! artifact's properties.

use std::any::Any;

use compreg_resolver::{Component, ComponentId, FromIdentity, ImplementationRegistry, SourceRef};

macro_rules! builtin_component {
    ($name:ident, $kind:literal) => {
        #[derive(Debug)]
        pub struct $name {
            id: ComponentId,
        }

        impl Component for $name {
            fn id(&self) -> ComponentId {
                self.id
            }

            fn kind(&self) -> &'static str {
                $kind
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl FromIdentity for $name {
            fn from_identity(id: ComponentId) -> Self {
                Self { id }
            }
        }
    };
}

builtin_component!(LocalArtifactStore, "artifact_store");
builtin_component!(SqliteMetadataStore, "metadata_store");
builtin_component!(LocalOrchestrator, "orchestrator");

pub const LOCAL_ARTIFACT_STORE: &str = "compreg.artifact_stores.LocalArtifactStore";
pub const SQLITE_METADATA_STORE: &str = "compreg.metadata_stores.SqliteMetadataStore";
pub const LOCAL_ORCHESTRATOR: &str = "compreg.orchestrators.LocalOrchestrator";

/// Stores created by `compreg init` when none are named.
pub const DEFAULT_STORES: &[&str] = &["artifact_stores", "metadata_stores", "orchestrators"];

/// Registry holding every built-in implementation.
pub fn implementations() -> anyhow::Result<ImplementationRegistry> {
    let mut registry = ImplementationRegistry::new();
    registry.register_type::<LocalArtifactStore>(SourceRef::parse(LOCAL_ARTIFACT_STORE)?)?;
    registry.register_type::<SqliteMetadataStore>(SourceRef::parse(SQLITE_METADATA_STORE)?)?;
    registry.register_type::<LocalOrchestrator>(SourceRef::parse(LOCAL_ORCHESTRATOR)?)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compreg_resolver::ComponentLoader;

    #[test]
    fn all_builtins_construct() {
        let registry = implementations().unwrap();
        assert_eq!(registry.len(), 3);

        let id = ComponentId::new();
        let orchestrator = registry
            .construct(&SourceRef::parse(LOCAL_ORCHESTRATOR).unwrap(), id)
            .unwrap();
        assert_eq!(orchestrator.kind(), "orchestrator");
        assert!(orchestrator.is::<LocalOrchestrator>());
        assert_eq!(orchestrator.id(), id);
    }
}
