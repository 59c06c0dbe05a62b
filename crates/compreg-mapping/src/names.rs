//! Component key validation.
//!
//! Keys are chosen by humans and end up in config files, CLI arguments, and
//! log lines. Valid keys:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `/`, `\`, or `:`
//! - Must not start with `.` or `-`
//! - Must not be longer than [`MAX_KEY_LEN`] bytes

use crate::error::{MappingError, Result};

/// Upper bound on key length in bytes.
pub const MAX_KEY_LEN: usize = 128;

/// Characters that are forbidden anywhere in a key.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':'];

/// Validate a component key, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use compreg_mapping::names::validate_key;
///
/// assert!(validate_key("local_store").is_ok());
/// assert!(validate_key("prod-metadata.v2").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("a/b").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: String| MappingError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    if key.is_empty() {
        return Err(invalid("key must not be empty".into()));
    }

    if key.len() > MAX_KEY_LEN {
        return Err(invalid(format!("key exceeds {MAX_KEY_LEN} bytes")));
    }

    if let Some(ch) = key.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(format!("contains whitespace or control character: {ch:?}")));
    }

    for ch in FORBIDDEN_CHARS {
        if key.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }

    if key.starts_with('.') || key.starts_with('-') {
        return Err(invalid("must not start with '.' or '-'".into()));
    }

    Ok(())
}
