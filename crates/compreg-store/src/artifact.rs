use chrono::{DateTime, Utc};
use compreg_types::{ComponentId, IdentityRecord, SourceRef};
use serde::{Deserialize, Serialize};

/// The persisted form of one component.
///
/// The store writes it as `<uuid>.json`. Resolution never reads it: only
/// the existence of the file matters there. Tooling that shows or migrates
/// components reads the body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub uuid: ComponentId,
    pub source: SourceRef,
    pub created_at: DateTime<Utc>,
    /// Implementation-specific settings, opaque to the registry.
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Artifact {
    /// Artifact for `record`, stamped with the current time and no properties.
    pub fn for_record(record: &IdentityRecord) -> Self {
        Self {
            uuid: record.id(),
            source: record.source().clone(),
            created_at: Utc::now(),
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// File name this artifact is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.uuid.canonical())
    }
}
