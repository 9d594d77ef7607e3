//! Per-request access decision for the protected endpoints of one resource.
//!
//! Evaluation order:
//! 1. unprotected endpoint → allow
//! 2. public resource → allow (no remote call)
//! 3. no credential → deny (unauthenticated)
//! 4. valid decision cookie for this credential + resource → allow (cache hit)
//! 5. remote check → allow and mint a fresh cookie, or deny (forbidden)
//!
//! Authority failures and timeouts fail closed. Denials are never cached.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use viewgate_core::{ResourceId, SharingLevel};
use viewgate_observability::GateMetrics;

use crate::{AccessDecision, AuthorityError, Credential, DecisionCodec, RemoteAuthority};

/// Set of request paths that require an access decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedEndpoints(HashSet<String>);

impl ProtectedEndpoints {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Lock-free, shared view of a resource's current sharing level.
///
/// A level set locally (configuration or [`AccessGate::set_sharing`]) holds
/// until changed. A `public` level learned from the authority is only a lease:
/// past its deadline the resource is treated as private until re-read.
///
/// Level and deadline share one atomic word: the low byte holds the level,
/// the rest the deadline in unix milliseconds.
///
/// Cloning shares the underlying value.
#[derive(Debug, Clone)]
pub struct SharingState(Arc<AtomicU64>);

impl SharingState {
    const PINNED: u64 = u64::MAX >> 8;

    pub fn new(level: SharingLevel) -> Self {
        Self(Arc::new(AtomicU64::new(Self::pack(level, Self::PINNED))))
    }

    fn pack(level: SharingLevel, until: u64) -> u64 {
        let bits = match level {
            SharingLevel::Public => 0,
            SharingLevel::Private => 1,
            SharingLevel::Secret => 2,
        };
        (until.min(Self::PINNED) << 8) | bits
    }

    fn unpack(word: u64) -> (SharingLevel, u64) {
        let level = match word & 0xff {
            0 => SharingLevel::Public,
            2 => SharingLevel::Secret,
            _ => SharingLevel::Private,
        };
        (level, word >> 8)
    }

    fn millis(at: DateTime<Utc>) -> u64 {
        u64::try_from(at.timestamp_millis()).unwrap_or(0)
    }

    /// Last stored level, ignoring any lease deadline.
    pub fn get(&self) -> SharingLevel {
        Self::unpack(self.0.load(Ordering::Acquire)).0
    }

    /// Level in force at `now`. A lapsed public lease reads as private.
    pub fn at(&self, now: DateTime<Utc>) -> SharingLevel {
        match Self::unpack(self.0.load(Ordering::Acquire)) {
            (SharingLevel::Public, until) if until < Self::millis(now) => SharingLevel::Private,
            (level, _) => level,
        }
    }

    /// True when a public lease learned from the authority has run out.
    pub fn lease_lapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(
            Self::unpack(self.0.load(Ordering::Acquire)),
            (SharingLevel::Public, until) if until < Self::millis(now)
        )
    }

    pub fn set(&self, level: SharingLevel) {
        self.0.store(Self::pack(level, Self::PINNED), Ordering::Release);
    }

    /// Record a level read from the authority. Public is held until `until`;
    /// private and secret are kept until the next read.
    pub fn observe(&self, level: SharingLevel, until: DateTime<Utc>) {
        let deadline = if level.is_public() {
            Self::millis(until)
        } else {
            Self::PINNED
        };
        self.0.store(Self::pack(level, deadline), Ordering::Release);
    }
}

/// Static gate configuration.
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub resource_id: ResourceId,
    pub protected: ProtectedEndpoints,
    /// TTL of every newly minted decision cookie.
    pub permissions_cache_expiry: Duration,
    /// Upper bound for each remote authority call.
    pub authority_timeout: std::time::Duration,
    /// Re-resolve the sharing level from the authority on every cache miss.
    /// A public answer is trusted for at most `permissions_cache_expiry`.
    pub refresh_sharing_on_miss: bool,
}

impl GateSettings {
    pub const DEFAULT_CACHE_EXPIRY_SECS: i64 = 300;
    pub const DEFAULT_AUTHORITY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    pub fn new(resource_id: ResourceId, protected: ProtectedEndpoints) -> Self {
        Self {
            resource_id,
            protected,
            permissions_cache_expiry: Duration::seconds(Self::DEFAULT_CACHE_EXPIRY_SECS),
            authority_timeout: Self::DEFAULT_AUTHORITY_TIMEOUT,
            refresh_sharing_on_miss: true,
        }
    }
}

/// Everything the gate needs to know about one request.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub credential: Option<&'a Credential>,
    pub decision_cookie: Option<&'a str>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateDenial {
    /// No credential on a protected endpoint (401).
    #[error("unauthenticated")]
    Unauthenticated,

    /// Credential present but denied, or the authority could not be consulted (403).
    #[error("forbidden")]
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(GateDenial),
}

/// A decision cookie minted by this evaluation, to be set on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedDecision {
    pub cookie_value: String,
    pub max_age: Duration,
    pub decision: AccessDecision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub minted: Option<MintedDecision>,
}

impl Evaluation {
    fn allow() -> Self {
        Self {
            verdict: Verdict::Allow,
            minted: None,
        }
    }

    fn deny(reason: GateDenial) -> Self {
        Self {
            verdict: Verdict::Deny(reason),
            minted: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }
}

/// Stateless per-request gate.
///
/// Holds only configuration, the signing codec, the authority handle and
/// counters; the decision cache lives in the client's cookie.
#[derive(Clone)]
pub struct AccessGate {
    settings: GateSettings,
    sharing: SharingState,
    codec: DecisionCodec,
    authority: Arc<dyn RemoteAuthority>,
    metrics: Arc<GateMetrics>,
}

impl AccessGate {
    pub fn new(
        settings: GateSettings,
        sharing: SharingLevel,
        codec: DecisionCodec,
        authority: Arc<dyn RemoteAuthority>,
    ) -> Self {
        Self {
            settings,
            sharing: SharingState::new(sharing),
            codec,
            authority,
            metrics: Arc::new(GateMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<GateMetrics> {
        &self.metrics
    }

    pub fn codec(&self) -> &DecisionCodec {
        &self.codec
    }

    /// Sharing level in force at `now`.
    pub fn sharing_at(&self, now: DateTime<Utc>) -> SharingLevel {
        self.sharing.at(now)
    }

    /// Change the resource's sharing level (external actor hook).
    pub fn set_sharing(&self, level: SharingLevel) {
        self.sharing.set(level);
    }

    pub async fn evaluate(&self, req: GateRequest<'_>) -> Evaluation {
        if !self.settings.protected.contains(req.path) {
            return Evaluation::allow();
        }

        let mut refreshed = false;
        if self.settings.refresh_sharing_on_miss && self.sharing.lease_lapsed(req.now) {
            self.refresh_sharing(req.now).await;
            refreshed = true;
        }

        if self.sharing.at(req.now).is_public() {
            self.metrics.record_public_allow();
            tracing::debug!(path = req.path, "public resource; allowing");
            return Evaluation::allow();
        }

        let Some(credential) = req.credential else {
            self.metrics.record_unauthenticated();
            return Evaluation::deny(GateDenial::Unauthenticated);
        };

        let fingerprint = match self.codec.fingerprint(credential) {
            Ok(fp) => fp,
            Err(e) => {
                tracing::warn!("failed to fingerprint credential: {e}");
                return Evaluation::deny(GateDenial::Forbidden);
            }
        };

        if let Some(cookie) = req.decision_cookie {
            match self.codec.decode(cookie, req.now) {
                Ok(decision) if decision.applies_to(&self.settings.resource_id, &fingerprint) => {
                    self.metrics.record_cache_hit();
                    tracing::debug!(
                        path = req.path,
                        fingerprint = fingerprint.short(),
                        "decision cookie hit"
                    );
                    return Evaluation::allow();
                }
                Ok(_) => tracing::debug!(
                    path = req.path,
                    "decision cookie minted for another credential or resource"
                ),
                Err(e) => tracing::debug!(path = req.path, "decision cookie ignored: {e}"),
            }
        }

        if self.settings.refresh_sharing_on_miss
            && !refreshed
            && self.refresh_sharing(req.now).await.is_public()
        {
            self.metrics.record_public_allow();
            return Evaluation::allow();
        }

        self.check_remote(req, credential, fingerprint).await
    }

    /// Re-read the sharing level and return the level in force at `now`.
    /// A failed lookup keeps the current level, except that a lapsed public
    /// lease drops to private.
    async fn refresh_sharing(&self, now: DateTime<Utc>) -> SharingLevel {
        self.metrics.record_sharing_lookup();
        let lookup = self.authority.current_sharing(&self.settings.resource_id);
        match self.bounded(lookup).await {
            Ok(level) => {
                self.sharing
                    .observe(level, now + self.settings.permissions_cache_expiry);
                level
            }
            Err(e) => {
                if self.sharing.lease_lapsed(now) {
                    self.sharing.set(SharingLevel::Private);
                }
                let kept = self.sharing.at(now);
                tracing::warn!(sharing = %kept, "sharing lookup failed, keeping last known level: {e}");
                kept
            }
        }
    }

    async fn check_remote(
        &self,
        req: GateRequest<'_>,
        credential: &Credential,
        fingerprint: crate::CredentialFingerprint,
    ) -> Evaluation {
        self.metrics.record_view_check();
        let check = self
            .authority
            .check_view_access(credential, &self.settings.resource_id);

        match self.bounded(check).await {
            Ok(true) => {
                self.metrics.record_grant();
                tracing::info!(
                    resource = %self.settings.resource_id,
                    fingerprint = fingerprint.short(),
                    "authority granted view access"
                );
                let decision = AccessDecision::granted(
                    self.settings.resource_id.clone(),
                    fingerprint,
                    req.now,
                    self.settings.permissions_cache_expiry,
                );
                let minted = match self.codec.encode(&decision) {
                    Ok(cookie_value) => Some(MintedDecision {
                        cookie_value,
                        max_age: self.settings.permissions_cache_expiry,
                        decision,
                    }),
                    Err(e) => {
                        tracing::warn!("failed to mint decision cookie: {e}");
                        None
                    }
                };
                Evaluation {
                    verdict: Verdict::Allow,
                    minted,
                }
            }
            Ok(false) => {
                self.metrics.record_denial();
                tracing::info!(
                    resource = %self.settings.resource_id,
                    fingerprint = fingerprint.short(),
                    "authority denied view access"
                );
                Evaluation::deny(GateDenial::Forbidden)
            }
            Err(e) => {
                self.metrics.record_authority_failure();
                tracing::warn!(resource = %self.settings.resource_id, "failing closed: {e}");
                Evaluation::deny(GateDenial::Forbidden)
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl core::future::Future<Output = Result<T, AuthorityError>>,
    ) -> Result<T, AuthorityError> {
        tokio::time::timeout(self.settings.authority_timeout, call)
            .await
            .map_err(|_| AuthorityError::Unavailable("authority call timed out".to_string()))?
    }
}
