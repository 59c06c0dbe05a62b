//! On-disk representation of the mapping tables.
//!
//! A mapping file is TOML or JSON, chosen by extension. It holds one mapping
//! table per store:
//!
//! ```toml
//! [stores.artifact_stores.local_store]
//! uuid = "67e55044-10b1-426f-9247-bb680e5fe0c8"
//! source = "compreg.stores.LocalArtifactStore"
//! ```
//!
//! Loading goes through [`MappingTable`]'s validation, so a file with a
//! duplicated identity or an invalid key is rejected as a whole.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MappingError, Result};
use crate::table::MappingTable;

/// Serialization format of a mapping file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingFormat {
    Toml,
    Json,
}

impl MappingFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(MappingError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Mapping tables for every store, keyed by store name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub stores: BTreeMap<String, MappingTable>,
}

impl MappingFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: set the table for `store`.
    pub fn with_table(mut self, store: impl Into<String>, table: MappingTable) -> Self {
        self.stores.insert(store.into(), table);
        self
    }

    /// The table for `store`, if any component was ever registered there.
    pub fn table(&self, store: &str) -> Option<&MappingTable> {
        self.stores.get(store)
    }

    /// The table for `store`, created empty if missing.
    pub fn table_mut(&mut self, store: &str) -> &mut MappingTable {
        self.stores.entry(store.to_string()).or_default()
    }

    /// Total entries across all stores.
    pub fn entry_count(&self) -> usize {
        self.stores.values().map(MappingTable::len).sum()
    }

    pub fn parse(input: &str, format: MappingFormat) -> Result<Self> {
        match format {
            MappingFormat::Toml => {
                toml::from_str(input).map_err(|e| MappingError::Serialization(e.to_string()))
            }
            MappingFormat::Json => {
                serde_json::from_str(input).map_err(|e| MappingError::Serialization(e.to_string()))
            }
        }
    }

    pub fn render(&self, format: MappingFormat) -> Result<String> {
        match format {
            MappingFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| MappingError::Serialization(e.to_string()))
            }
            MappingFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| MappingError::Serialization(e.to_string())),
        }
    }

    /// Read and validate a mapping file.
    pub fn load(path: &Path) -> Result<Self> {
        let format = MappingFormat::from_path(path)?;
        let input = std::fs::read_to_string(path)?;
        let file = Self::parse(&input, format)?;
        tracing::debug!(path = %path.display(), entries = file.entry_count(), "loaded mapping file");
        Ok(file)
    }

    /// Like [`load`](Self::load), but a missing file yields no tables.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::metadata(path) {
            Ok(_) => Self::load(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                MappingFormat::from_path(path)?;
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the mapping file.
    ///
    /// The contents are written to a temporary file in the same directory and
    /// renamed into place, so readers never observe a partial file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = MappingFormat::from_path(path)?;
        let rendered = self.render(format)?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| MappingError::Io(e.error))?;

        tracing::debug!(path = %path.display(), entries = self.entry_count(), "saved mapping file");
        Ok(())
    }
}
