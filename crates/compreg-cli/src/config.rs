use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "compreg.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding one sub-directory per store.
    pub root: PathBuf,
    /// Mapping file; relative paths are resolved against `root`.
    pub mapping: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".compreg"),
            mapping: PathBuf::from("mapping.toml"),
        }
    }
}

impl CliConfig {
    /// Load `path`, or the default file if `path` is `None`.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let input = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&input)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, root: Option<PathBuf>, mapping: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.root = root;
        }
        if let Some(mapping) = mapping {
            self.mapping = mapping;
        }
        self
    }

    pub fn mapping_path(&self) -> PathBuf {
        if self.mapping.is_absolute() {
            self.mapping.clone()
        } else {
            self.root.join(&self.mapping)
        }
    }
}
