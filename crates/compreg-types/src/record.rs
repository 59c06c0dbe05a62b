use serde::{Deserialize, Serialize};

use crate::identity::ComponentId;
use crate::source::SourceRef;

/// One registered component: its stable identity and the implementation
/// that constructs it.
///
/// Records are immutable once built. Field names match the on-disk mapping
/// file layout (`uuid`, `source`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(rename = "uuid")]
    id: ComponentId,
    source: SourceRef,
}

impl IdentityRecord {
    pub fn new(id: ComponentId, source: SourceRef) -> Self {
        Self { id, source }
    }

    /// Build a record with a freshly generated identity.
    pub fn fresh(source: SourceRef) -> Self {
        Self::new(ComponentId::new(), source)
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }
}
