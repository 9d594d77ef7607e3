//! Gate counters.
//!
//! Counters are monotonically increasing and lock-free; they are shared by all
//! concurrent evaluations through an `Arc<GateMetrics>`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct GateMetrics {
    view_checks: AtomicU64,
    sharing_lookups: AtomicU64,
    cache_hits: AtomicU64,
    public_allows: AtomicU64,
    grants: AtomicU64,
    denials: AtomicU64,
    authority_failures: AtomicU64,
    unauthenticated: AtomicU64,
}

/// Point-in-time copy of [`GateMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GateMetricsSnapshot {
    /// Calls made to the remote authority's view-access check.
    pub view_checks: u64,
    /// Calls made to the remote authority's sharing lookup.
    pub sharing_lookups: u64,
    /// Requests allowed from a valid decision cookie.
    pub cache_hits: u64,
    /// Requests allowed because the resource is public.
    pub public_allows: u64,
    /// Remote checks that granted access.
    pub grants: u64,
    /// Remote checks that denied access.
    pub denials: u64,
    /// Remote checks that failed (fail-closed).
    pub authority_failures: u64,
    /// Protected requests without a credential.
    pub unauthenticated: u64,
}

macro_rules! counter {
    ($record:ident, $get:ident, $field:ident) => {
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }

        pub fn $get(&self) -> u64 {
            self.$field.load(Ordering::Relaxed)
        }
    };
}

impl GateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(record_view_check, view_checks, view_checks);
    counter!(record_sharing_lookup, sharing_lookups, sharing_lookups);
    counter!(record_cache_hit, cache_hits, cache_hits);
    counter!(record_public_allow, public_allows, public_allows);
    counter!(record_grant, grants, grants);
    counter!(record_denial, denials, denials);
    counter!(record_authority_failure, authority_failures, authority_failures);
    counter!(record_unauthenticated, unauthenticated, unauthenticated);

    pub fn snapshot(&self) -> GateMetricsSnapshot {
        GateMetricsSnapshot {
            view_checks: self.view_checks(),
            sharing_lookups: self.sharing_lookups(),
            cache_hits: self.cache_hits(),
            public_allows: self.public_allows(),
            grants: self.grants(),
            denials: self.denials(),
            authority_failures: self.authority_failures(),
            unauthenticated: self.unauthenticated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let m = GateMetrics::new();
        m.record_view_check();
        m.record_view_check();
        m.record_cache_hit();

        let snap = m.snapshot();
        assert_eq!(snap.view_checks, 2);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.grants, 0);
    }

    #[test]
    fn snapshot_serializes_as_flat_object() {
        let m = GateMetrics::new();
        m.record_denial();
        let json = serde_json::to_value(m.snapshot()).unwrap();
        assert_eq!(json["denials"], 1);
        assert_eq!(json["view_checks"], 0);
    }
}
