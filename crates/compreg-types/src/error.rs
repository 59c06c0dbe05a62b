use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid component identity {input:?}: {reason}")]
    InvalidIdentity { input: String, reason: String },

    #[error("invalid implementation reference {input:?}: {reason}")]
    InvalidSource { input: String, reason: String },
}
