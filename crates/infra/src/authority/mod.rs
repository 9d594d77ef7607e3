//! `RemoteAuthority` adapters.
//!
//! - `http`: client for the remote permission service (production)
//! - `in_memory`: scriptable authority for dev/tests

pub mod http;
pub mod in_memory;

pub use http::{HttpAuthority, HttpAuthorityError};
pub use in_memory::InMemoryAuthority;
