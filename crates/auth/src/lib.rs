//! `viewgate-auth` — access decision boundary (zero-trust, stateless).
//!
//! This crate is intentionally decoupled from HTTP and storage: callers hand in
//! the extracted credential and cookie values, and get back a verdict plus an
//! optional freshly minted decision cookie value.

pub mod authority;
pub mod clock;
pub mod credential;
pub mod csrf;
pub mod decision;
pub mod gate;

pub use authority::{AuthorityError, RemoteAuthority};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{Credential, CredentialFingerprint};
pub use csrf::{CsrfGuard, CsrfToken};
pub use decision::{AccessDecision, DecisionCodec, DecisionError, SigningKey, validate_window};
pub use gate::{
    AccessGate, Evaluation, GateDenial, GateRequest, GateSettings, MintedDecision,
    ProtectedEndpoints, SharingState, Verdict,
};
