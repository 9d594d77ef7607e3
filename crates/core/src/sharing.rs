use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Sharing classification of a resource.
///
/// Set by an external actor and mutable at any time; consumers must re-resolve
/// it instead of assuming it is static.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SharingLevel {
    /// Anyone may view, no credential required.
    Public,
    /// Only principals the authority grants may view.
    #[default]
    Private,
    /// Like `Private` from the gate's point of view (share-key links are resolved by the authority).
    Secret,
}

impl SharingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharingLevel::Public => "public",
            SharingLevel::Private => "private",
            SharingLevel::Secret => "secret",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, SharingLevel::Public)
    }
}

impl core::fmt::Display for SharingLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharingLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(SharingLevel::Public),
            "private" => Ok(SharingLevel::Private),
            "secret" => Ok(SharingLevel::Secret),
            other => Err(DomainError::UnknownSharing(other.to_string())),
        }
    }
}
