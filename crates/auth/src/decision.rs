//! Signed, expiring access decisions and their cookie wire format.
//!
//! Wire format: `v1.<base64url(json payload)>.<hex hmac-sha256>`.
//!
//! The MAC covers the version prefix and the exact encoded payload, so the
//! resource id, credential fingerprint, grant flag and both timestamps are
//! bound together. Any decode failure means "no cached decision".

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use viewgate_core::ResourceId;

use crate::{Credential, CredentialFingerprint};

type HmacSha256 = Hmac<Sha256>;

const WIRE_VERSION: &str = "v1";
const FINGERPRINT_DOMAIN: &[u8] = b"credential:";

/// Tolerated clock skew between the minting and the verifying instance.
pub const MAX_ISSUE_SKEW_SECS: i64 = 60;

/// Server-side secret keying the decision MAC and credential fingerprints.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SigningKey(<{} bytes>)", self.0.len())
    }
}

/// A cached authorization outcome for one credential on one resource.
///
/// Produced only after a successful remote check; never persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    #[serde(rename = "rid")]
    pub resource_id: ResourceId,

    #[serde(rename = "cfp")]
    pub credential_fingerprint: CredentialFingerprint,

    pub granted: bool,

    #[serde(rename = "iat", with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl AccessDecision {
    pub fn granted(
        resource_id: ResourceId,
        credential_fingerprint: CredentialFingerprint,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            resource_id,
            credential_fingerprint,
            granted: true,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    /// Whether this decision answers for `resource_id` and `fingerprint`.
    pub fn applies_to(&self, resource_id: &ResourceId, fingerprint: &CredentialFingerprint) -> bool {
        self.granted
            && &self.resource_id == resource_id
            && bool::from(
                self.credential_fingerprint
                    .as_str()
                    .as_bytes()
                    .ct_eq(fingerprint.as_str().as_bytes()),
            )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("malformed decision cookie: {0}")]
    Malformed(&'static str),

    #[error("unsupported decision cookie version")]
    UnsupportedVersion,

    #[error("decision cookie signature mismatch")]
    BadSignature,

    #[error("decision has expired")]
    Expired,

    #[error("decision not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid decision time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("decision does not grant access")]
    NotGranted,

    #[error("failed to encode decision: {0}")]
    Encode(String),
}

/// Deterministically validate a decision's time window.
///
/// A decision is still fresh at exactly `expires_at`; it expires once `now`
/// passes it.
pub fn validate_window(decision: &AccessDecision, now: DateTime<Utc>) -> Result<(), DecisionError> {
    if decision.expires_at <= decision.issued_at {
        return Err(DecisionError::InvalidTimeWindow);
    }
    if decision.issued_at > now + Duration::seconds(MAX_ISSUE_SKEW_SECS) {
        return Err(DecisionError::NotYetValid);
    }
    if now > decision.expires_at {
        return Err(DecisionError::Expired);
    }
    Ok(())
}

/// Encodes and verifies decision cookies, and fingerprints credentials.
#[derive(Debug, Clone)]
pub struct DecisionCodec {
    key: SigningKey,
}

impl DecisionCodec {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    fn mac(&self) -> Result<HmacSha256, DecisionError> {
        HmacSha256::new_from_slice(&self.key.0).map_err(|e| DecisionError::Encode(e.to_string()))
    }

    fn sign(&self, signed_part: &str) -> Result<String, DecisionError> {
        let mut mac = self.mac()?;
        mac.update(signed_part.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Keyed fingerprint of a credential (hex HMAC-SHA256).
    pub fn fingerprint(&self, credential: &Credential) -> Result<CredentialFingerprint, DecisionError> {
        let mut mac = self.mac()?;
        mac.update(FINGERPRINT_DOMAIN);
        mac.update(credential.as_str().as_bytes());
        Ok(CredentialFingerprint::from_hex(hex::encode(
            mac.finalize().into_bytes(),
        )))
    }

    pub fn encode(&self, decision: &AccessDecision) -> Result<String, DecisionError> {
        let payload =
            serde_json::to_vec(decision).map_err(|e| DecisionError::Encode(e.to_string()))?;
        let signed_part = format!("{WIRE_VERSION}.{}", URL_SAFE_NO_PAD.encode(payload));
        let tag = self.sign(&signed_part)?;
        Ok(format!("{signed_part}.{tag}"))
    }

    /// Verify and decode a cookie value.
    ///
    /// The signature is checked before the payload is parsed; nothing from an
    /// unverified cookie is ever returned.
    pub fn decode(&self, value: &str, now: DateTime<Utc>) -> Result<AccessDecision, DecisionError> {
        let (signed_part, tag) = value
            .rsplit_once('.')
            .ok_or(DecisionError::Malformed("missing signature"))?;
        let (version, payload) = signed_part
            .split_once('.')
            .ok_or(DecisionError::Malformed("missing version"))?;
        if payload.contains('.') {
            return Err(DecisionError::Malformed("too many segments"));
        }
        if version != WIRE_VERSION {
            return Err(DecisionError::UnsupportedVersion);
        }

        let expected = self.sign(signed_part)?;
        // Compared as lowercase hex text so that case-flipped digits are rejected too.
        if !bool::from(expected.as_bytes().ct_eq(tag.as_bytes())) {
            return Err(DecisionError::BadSignature);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| DecisionError::Malformed("payload is not base64url"))?;
        let decision: AccessDecision = serde_json::from_slice(&bytes)
            .map_err(|_| DecisionError::Malformed("payload is not a decision"))?;

        validate_window(&decision, now)?;
        if !decision.granted {
            return Err(DecisionError::NotGranted);
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec() -> DecisionCodec {
        DecisionCodec::new(SigningKey::new(b"0123456789abcdef-test".to_vec()))
    }

    fn resource() -> ResourceId {
        ResourceId::new("alice:42").unwrap()
    }

    fn decision_at(now: DateTime<Utc>, ttl_secs: i64) -> AccessDecision {
        let codec = codec();
        let fp = codec
            .fingerprint(&Credential::new("token-c").unwrap())
            .unwrap();
        AccessDecision::granted(resource(), fp, now, Duration::seconds(ttl_secs))
    }

    #[test]
    fn encode_then_decode_returns_same_decision() {
        let now = Utc::now();
        let decision = decision_at(now, 300);
        let value = codec().encode(&decision).unwrap();

        assert!(value.starts_with("v1."));
        assert_eq!(value.split('.').count(), 3);
        assert_eq!(codec().decode(&value, now).unwrap(), decision);
    }

    #[test]
    fn decision_is_fresh_until_expiry_then_invalid() {
        let now = Utc::now();
        let value = codec().encode(&decision_at(now, 30)).unwrap();

        assert!(codec().decode(&value, now + Duration::seconds(5)).is_ok());
        assert!(codec().decode(&value, now + Duration::seconds(30)).is_ok());
        assert_eq!(
            codec().decode(&value, now + Duration::seconds(31)),
            Err(DecisionError::Expired)
        );
    }

    #[test]
    fn other_signing_key_is_rejected() {
        let now = Utc::now();
        let value = codec().encode(&decision_at(now, 300)).unwrap();
        let other = DecisionCodec::new(SigningKey::new(b"a-different-secret-key".to_vec()));

        assert_eq!(other.decode(&value, now), Err(DecisionError::BadSignature));
    }

    #[test]
    fn structural_garbage_is_malformed() {
        let now = Utc::now();
        assert!(matches!(codec().decode("", now), Err(DecisionError::Malformed(_))));
        assert!(matches!(codec().decode("v1", now), Err(DecisionError::Malformed(_))));
        assert!(matches!(
            codec().decode("v1.a.b.c", now),
            Err(DecisionError::Malformed(_))
        ));
        assert_eq!(
            codec().decode("v2.abc.def", now),
            Err(DecisionError::UnsupportedVersion)
        );
    }

    #[test]
    fn denied_decisions_never_decode_as_cache_hits() {
        let now = Utc::now();
        let mut decision = decision_at(now, 300);
        decision.granted = false;
        let value = codec().encode(&decision).unwrap();

        assert_eq!(codec().decode(&value, now), Err(DecisionError::NotGranted));
    }

    #[test]
    fn window_checks_match_claim_rules() {
        let now = Utc::now();
        let mut d = decision_at(now, 300);

        d.expires_at = d.issued_at;
        assert_eq!(validate_window(&d, now), Err(DecisionError::InvalidTimeWindow));

        let d = decision_at(now + Duration::seconds(MAX_ISSUE_SKEW_SECS + 10), 300);
        assert_eq!(validate_window(&d, now), Err(DecisionError::NotYetValid));

        let d = decision_at(now + Duration::seconds(5), 300);
        assert!(validate_window(&d, now).is_ok());
    }

    #[test]
    fn applies_only_to_same_resource_and_credential() {
        let now = Utc::now();
        let codec = codec();
        let d = decision_at(now, 300);
        let same = codec.fingerprint(&Credential::new("token-c").unwrap()).unwrap();
        let other = codec.fingerprint(&Credential::new("token-d").unwrap()).unwrap();

        assert!(d.applies_to(&resource(), &same));
        assert!(!d.applies_to(&resource(), &other));
        assert!(!d.applies_to(&ResourceId::new("alice:43").unwrap(), &same));
    }

    #[test]
    fn fingerprint_depends_on_key_and_hides_credential() {
        let cred = Credential::new("token-c").unwrap();
        let a = codec().fingerprint(&cred).unwrap();
        let b = DecisionCodec::new(SigningKey::new(b"another-signing-key".to_vec()))
            .fingerprint(&cred)
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(!a.as_str().contains("token-c"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: flipping any single bit of a valid cookie invalidates it.
        #[test]
        fn any_bit_flip_invalidates_cookie(index in any::<prop::sample::Index>(), bit in 0u8..8) {
            let now = Utc::now();
            let value = codec().encode(&decision_at(now, 300)).unwrap();

            let mut bytes = value.into_bytes();
            let i = index.index(bytes.len());
            bytes[i] ^= 1 << bit;

            if let Ok(tampered) = String::from_utf8(bytes) {
                prop_assert!(codec().decode(&tampered, now).is_err());
            }
        }
    }
}
