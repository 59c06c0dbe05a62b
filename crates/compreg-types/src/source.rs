use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Reference to a loadable component implementation.
///
/// The reference has the form `module.path.TypeName`: a dot-separated module
/// path followed by the type name. It is opaque to the mapping table and is
/// only interpreted by a loader when a component is instantiated.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceRef {
    full: String,
    split: usize,
}

impl SourceRef {
    /// Parse and validate an implementation reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use compreg_types::SourceRef;
    ///
    /// let src = SourceRef::parse("compreg.stores.LocalArtifactStore").unwrap();
    /// assert_eq!(src.module(), "compreg.stores");
    /// assert_eq!(src.type_name(), "LocalArtifactStore");
    /// assert!(SourceRef::parse("NoModule").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidSource {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let split = s
            .rfind('.')
            .ok_or_else(|| invalid("expected `module.TypeName`"))?;

        for segment in s.split('.') {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(&format!("segment {segment:?} is not an identifier")));
            }
            if segment.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(invalid(&format!("segment {segment:?} starts with a digit")));
            }
        }

        Ok(Self {
            full: s.to_string(),
            split,
        })
    }

    /// The module path (everything before the last `.`).
    pub fn module(&self) -> &str {
        &self.full[..self.split]
    }

    /// The type name (everything after the last `.`).
    pub fn type_name(&self) -> &str {
        &self.full[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl FromStr for SourceRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SourceRef {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<SourceRef> for String {
    fn from(src: SourceRef) -> Self {
        src.full
    }
}

impl AsRef<str> for SourceRef {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

impl fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceRef({})", self.full)
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}
