use serde::{Deserialize, Serialize};

/// Opaque bearer credential identifying a principal to the remote authority.
///
/// Supplied by the client on every request and never stored server-side.
/// `Debug` is redacted so credentials cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only values.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Keyed digest of a [`Credential`], safe to embed in client-held cookies.
///
/// Produced by [`crate::DecisionCodec::fingerprint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialFingerprint(String);

impl CredentialFingerprint {
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log correlation.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl core::fmt::Display for CredentialFingerprint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
