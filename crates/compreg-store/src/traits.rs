use compreg_types::ComponentId;

use crate::artifact::Artifact;
use crate::error::{StoreError, StoreResult};

/// A set of named stores, each holding one persisted artifact per component.
///
/// All implementations must satisfy these invariants:
/// - An entry is named by a rendering of the component's identity; any
///   extension is ignored. Writes use the canonical rendering, while reads,
///   removals, and membership checks match any rendering that parses to the
///   same identity.
/// - Listing a store that does not exist fails with
///   [`StoreError::StoreNotFound`]. An existing but empty store lists as an
///   empty list.
/// - Listing never interprets artifact contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait StoreDirectory: Send + Sync {
    /// The identity renderings of every entry persisted in `store`.
    ///
    /// Entries are returned as raw file stems, sorted, one per entry. Two
    /// entries with the same stem (differing only in extension) are both
    /// listed. Stems are not validated as identities here; callers decide
    /// how to treat malformed or repeated stems.
    fn list_persisted_identities(&self, store: &str) -> StoreResult<Vec<String>>;

    /// Write (create or replace) the artifact for `artifact.uuid` in `store`,
    /// creating the store if needed.
    fn persist(&self, store: &str, artifact: &Artifact) -> StoreResult<()>;

    /// Read the artifact persisted for `id`.
    ///
    /// Returns `Ok(None)` if no entry exists for `id`.
    fn read_artifact(&self, store: &str, id: &ComponentId) -> StoreResult<Option<Artifact>>;

    /// Delete every entry for `id`. Returns `true` if any existed.
    fn remove(&self, store: &str, id: &ComponentId) -> StoreResult<bool>;

    /// Names of all existing stores, sorted.
    fn stores(&self) -> StoreResult<Vec<String>>;

    /// Check whether `id` is persisted in `store`.
    ///
    /// Default implementation lists the store. A missing store counts as
    /// "not persisted".
    fn contains(&self, store: &str, id: &ComponentId) -> StoreResult<bool> {
        match self.list_persisted_identities(store) {
            Ok(entries) => Ok(entries.iter().any(|stem| names_identity(stem, id))),
            Err(StoreError::StoreNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Whether the entry name `stem` is a rendering of `id`.
pub fn names_identity(stem: &str, id: &ComponentId) -> bool {
    ComponentId::parse(stem).is_ok_and(|parsed| parsed == *id)
}

/// Validate a store name for use as a single directory component.
pub fn validate_store_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidStoreName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("store name must not be empty"));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("must not contain path separators"));
    }
    if name.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(invalid("must not contain whitespace or control characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_rendering_names_the_identity() {
        let id = ComponentId::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert!(names_identity("67e55044-10b1-426f-9247-bb680e5fe0c8", &id));
        assert!(names_identity("67E55044-10B1-426F-9247-BB680E5FE0C8", &id));
        assert!(names_identity("67e5504410b1426f9247bb680e5fe0c8", &id));
        assert!(!names_identity("67e55044", &id));
        assert!(!names_identity("00000000-0000-0000-0000-000000000000", &id));
    }

    #[test]
    fn valid_store_names() {
        assert!(validate_store_name("artifact_stores").is_ok());
        assert!(validate_store_name("metadata-stores").is_ok());
    }

    #[test]
    fn reject_traversal_and_separators() {
        assert!(validate_store_name("").is_err());
        assert!(validate_store_name("..").is_err());
        assert!(validate_store_name(".hidden").is_err());
        assert!(validate_store_name("a/b").is_err());
        assert!(validate_store_name("a\\b").is_err());
        assert!(validate_store_name("a b").is_err());
    }
}
