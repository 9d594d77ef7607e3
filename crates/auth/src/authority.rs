//! Boundary to the authoritative permission service.

use async_trait::async_trait;
use thiserror::Error;

use viewgate_core::{ResourceId, SharingLevel};

use crate::Credential;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    /// Network fault, timeout or unexpected upstream response.
    #[error("authority unavailable: {0}")]
    Unavailable(String),

    /// The authority rejected the credential itself (not the access request).
    #[error("authority rejected the credential")]
    InvalidCredential,
}

/// Authoritative, out-of-process permission check.
///
/// Implementations must be cheap to share across concurrent requests; the gate
/// applies its own timeout around every call.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Whether `credential` may view `resource`.
    async fn check_view_access(
        &self,
        credential: &Credential,
        resource: &ResourceId,
    ) -> Result<bool, AuthorityError>;

    /// The resource's current sharing level.
    async fn current_sharing(&self, resource: &ResourceId) -> Result<SharingLevel, AuthorityError>;
}
