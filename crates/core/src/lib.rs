//! `viewgate-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod sharing;

pub use error::DomainError;
pub use id::ResourceId;
pub use sharing::SharingLevel;
