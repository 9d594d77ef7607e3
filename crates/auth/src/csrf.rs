//! Anti-forgery tokens for the login endpoint (double-submit cookie).

use rand::RngCore;
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// Random, unguessable anti-forgery value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and validates CSRF tokens.
///
/// Stateless: the token lives in a session cookie and the client echoes it in
/// a header; a login is accepted only when both are present and equal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsrfGuard;

impl CsrfGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn issue(&self) -> CsrfToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        CsrfToken(hex::encode(bytes))
    }

    /// True iff both tokens are present, non-empty and equal.
    pub fn validate(&self, request_token: Option<&str>, cookie_token: Option<&str>) -> bool {
        match (request_token, cookie_token) {
            (Some(req), Some(cookie)) if !req.is_empty() && !cookie.is_empty() => {
                req.as_bytes().ct_eq(cookie.as_bytes()).into()
            }
            _ => false,
        }
    }
}
