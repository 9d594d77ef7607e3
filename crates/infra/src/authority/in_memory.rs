use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use viewgate_auth::{AuthorityError, Credential, RemoteAuthority};
use viewgate_core::{ResourceId, SharingLevel};

/// In-memory permission service.
///
/// Intended for tests/dev. Public resources are viewable by any credential;
/// otherwise only explicitly granted credentials may view. Unknown resources
/// are private.
#[derive(Debug, Default)]
pub struct InMemoryAuthority {
    grants: RwLock<HashMap<ResourceId, HashSet<String>>>,
    sharing: RwLock<HashMap<ResourceId, SharingLevel>>,
    rejected: RwLock<HashSet<String>>,
    unavailable: AtomicBool,
    view_checks: AtomicU64,
    sharing_lookups: AtomicU64,
}

impl InMemoryAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, resource: &ResourceId, credential: &str) {
        self.grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(resource.clone())
            .or_default()
            .insert(credential.to_string());
    }

    pub fn revoke(&self, resource: &ResourceId, credential: &str) {
        if let Some(set) = self
            .grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(resource)
        {
            set.remove(credential);
        }
    }

    pub fn set_sharing(&self, resource: &ResourceId, level: SharingLevel) {
        self.sharing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(resource.clone(), level);
    }

    /// Make the authority answer `InvalidCredential` for this credential.
    pub fn reject_credential(&self, credential: &str) {
        self.rejected
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(credential.to_string());
    }

    /// Simulate an outage: every call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `check_view_access` calls received so far.
    pub fn view_checks(&self) -> u64 {
        self.view_checks.load(Ordering::SeqCst)
    }

    pub fn sharing_lookups(&self) -> u64 {
        self.sharing_lookups.load(Ordering::SeqCst)
    }

    fn sharing_of(&self, resource: &ResourceId) -> SharingLevel {
        self.sharing
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(resource)
            .copied()
            .unwrap_or_default()
    }

    fn ensure_available(&self) -> Result<(), AuthorityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthorityError::Unavailable("in-memory authority offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteAuthority for InMemoryAuthority {
    async fn check_view_access(
        &self,
        credential: &Credential,
        resource: &ResourceId,
    ) -> Result<bool, AuthorityError> {
        self.view_checks.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        if self
            .rejected
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(credential.as_str())
        {
            return Err(AuthorityError::InvalidCredential);
        }
        if self.sharing_of(resource).is_public() {
            return Ok(true);
        }

        Ok(self
            .grants
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(resource)
            .is_some_and(|set| set.contains(credential.as_str())))
    }

    async fn current_sharing(&self, resource: &ResourceId) -> Result<SharingLevel, AuthorityError> {
        self.sharing_lookups.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        Ok(self.sharing_of(resource))
    }
}
