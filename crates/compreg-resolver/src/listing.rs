//! Results of store enumeration and store checks.

use std::collections::BTreeMap;
use std::fmt;

use compreg_loader::Component;
use compreg_types::ComponentId;
use serde::Serialize;

/// One inconsistency between a mapping table and a store directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drift {
    /// A persisted identity has no mapping table entry.
    Unregistered { id: ComponentId },
    /// A store entry whose name is not a component identity.
    MalformedEntry { entry: String, reason: String },
    /// A second store entry resolving to an identity already seen.
    DuplicateEntry { entry: String, id: ComponentId },
    /// Registered and persisted, but the implementation failed to load.
    LoadFailed {
        key: String,
        id: ComponentId,
        reason: String,
    },
    /// Registered but never persisted. Only reported by store checks;
    /// enumeration excludes these silently.
    NotPersisted { key: String, id: ComponentId },
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered { id } => write!(f, "{id}: persisted but not registered"),
            Self::MalformedEntry { entry, reason } => {
                write!(f, "{entry:?}: not a component identity ({reason})")
            }
            Self::DuplicateEntry { entry, id } => {
                write!(f, "{entry:?}: duplicate entry for {id}")
            }
            Self::LoadFailed { key, id, reason } => {
                write!(f, "{key} ({id}): failed to load: {reason}")
            }
            Self::NotPersisted { key, id } => {
                write!(f, "{key} ({id}): registered but not persisted")
            }
        }
    }
}

/// Live components found in a store, plus every entry that was skipped.
///
/// `components` holds exactly the keys that are both registered and
/// persisted and whose implementation loaded.
#[derive(Debug)]
pub struct StoreListing {
    pub store: String,
    pub components: BTreeMap<String, Box<dyn Component>>,
    pub drift: Vec<Drift>,
}

impl StoreListing {
    pub(crate) fn new(store: &str) -> Self {
        Self {
            store: store.to_string(),
            components: BTreeMap::new(),
            drift: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&dyn Component> {
        self.components.get(key).map(Box::as_ref)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// `true` if no entry was skipped.
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty()
    }

    /// Drop the diagnostics and keep only the components.
    pub fn into_components(self) -> BTreeMap<String, Box<dyn Component>> {
        self.components
    }
}

/// Status of a store without instantiating anything.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    pub store: String,
    /// Keys that are both registered and persisted, in key order.
    pub consistent: Vec<(String, ComponentId)>,
    pub drift: Vec<Drift>,
}

impl StoreReport {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> ComponentId {
        ComponentId::from_uuid(uuid::Uuid::from_u128(n))
    }

    #[test]
    fn drift_serializes_with_kind_tag() {
        let value = serde_json::to_value(Drift::Unregistered { id: id(3) }).unwrap();
        assert_eq!(value["kind"], "unregistered");
        assert_eq!(value["id"], "00000000-0000-0000-0000-000000000003");
    }

    #[test]
    fn drift_display_names_the_entry() {
        let drift = Drift::NotPersisted {
            key: "alpha".into(),
            id: id(1),
        };
        let text = drift.to_string();
        assert!(text.starts_with("alpha ("));
        assert!(text.ends_with("registered but not persisted"));
    }

    #[test]
    fn empty_listing_is_consistent() {
        let listing = StoreListing::new("s");
        assert!(listing.is_empty());
        assert!(listing.is_consistent());
        assert!(listing.get("anything").is_none());
    }
}
