//! Infrastructure layer: adapters for external services.

pub mod authority;
