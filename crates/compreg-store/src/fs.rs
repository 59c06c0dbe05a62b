//! Filesystem-backed store directory.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/
//!   <store_name>/
//!     <uuid>.json
//!     <uuid>.json
//! ```
//!
//! Hidden files (including in-flight temporary files) and sub-directories
//! are not entries.

use std::io::Write;
use std::path::{Path, PathBuf};

use compreg_types::ComponentId;

use crate::artifact::Artifact;
use crate::error::{StoreError, StoreResult};
use crate::traits::{names_identity, validate_store_name, StoreDirectory};

/// A [`StoreDirectory`] rooted at a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsStoreDirectory {
    root: PathBuf,
}

impl FsStoreDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory backing `store`.
    pub fn store_path(&self, store: &str) -> StoreResult<PathBuf> {
        validate_store_name(store)?;
        Ok(self.root.join(store))
    }

    fn artifact_path(&self, store: &str, id: &ComponentId) -> StoreResult<PathBuf> {
        Ok(self.store_path(store)?.join(format!("{}.json", id.canonical())))
    }

    /// Every entry naming `id`, under any rendering and extension.
    ///
    /// The canonical `<uuid>.json` path, if present, comes first.
    fn entries_for(&self, store: &str, id: &ComponentId) -> StoreResult<Vec<PathBuf>> {
        let dir = self.store_path(store)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let preferred = self.artifact_path(store, id)?;
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if entry_stem(&path).is_some_and(|stem| names_identity(&stem, id)) {
                found.push(path);
            }
        }
        found.sort_by_key(|p| (*p != preferred, p.clone()));
        Ok(found)
    }
}

/// File stem of a directory entry, or `None` for entries that are skipped.
fn entry_stem(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem)
}

impl StoreDirectory for FsStoreDirectory {
    fn list_persisted_identities(&self, store: &str) -> StoreResult<Vec<String>> {
        let dir = self.store_path(store)?;
        if !dir.is_dir() {
            return Err(StoreError::StoreNotFound {
                store: store.to_string(),
                path: dir,
            });
        }

        let mut stems = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() {
                tracing::trace!(path = %path.display(), "skipping non-file store entry");
                continue;
            }
            match entry_stem(&path) {
                Some(stem) => stems.push(stem),
                None => tracing::trace!(path = %path.display(), "skipping hidden store entry"),
            }
        }
        stems.sort();

        tracing::debug!(store, entries = stems.len(), "listed store directory");
        Ok(stems)
    }

    fn persist(&self, store: &str, artifact: &Artifact) -> StoreResult<()> {
        let dir = self.store_path(store)?;
        std::fs::create_dir_all(&dir)?;

        let body = serde_json::to_vec_pretty(artifact)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut tmp = tempfile::Builder::new().prefix(".tmp-").tempfile_in(&dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        let path = dir.join(artifact.file_name());
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(store, id = %artifact.uuid, path = %path.display(), "persisted artifact");
        Ok(())
    }

    fn read_artifact(&self, store: &str, id: &ComponentId) -> StoreResult<Option<Artifact>> {
        let Some(path) = self.entries_for(store, id)?.into_iter().next() else {
            return Ok(None);
        };
        let bytes = std::fs::read(&path)?;
        let artifact: Artifact =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptArtifact {
                store: store.to_string(),
                id: *id,
                reason: e.to_string(),
            })?;
        if artifact.uuid != *id {
            return Err(StoreError::CorruptArtifact {
                store: store.to_string(),
                id: *id,
                reason: format!("artifact body names identity {}", artifact.uuid),
            });
        }
        Ok(Some(artifact))
    }

    fn remove(&self, store: &str, id: &ComponentId) -> StoreResult<bool> {
        let paths = self.entries_for(store, id)?;
        for path in &paths {
            std::fs::remove_file(path)?;
            tracing::debug!(store, id = %id, path = %path.display(), "removed artifact");
        }
        Ok(!paths.is_empty())
    }

    fn stores(&self) -> StoreResult<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_store_name(&name).is_ok() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
