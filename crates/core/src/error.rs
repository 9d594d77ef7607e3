//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Keep this focused on deterministic failures of domain values (parsing,
/// validation). Transport and remote-service failures belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. empty or containing path separators).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A sharing level string was not one of `public`, `private`, `secret`.
    #[error("unknown sharing level: {0}")]
    UnknownSharing(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
