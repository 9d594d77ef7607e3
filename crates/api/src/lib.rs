//! HTTP API: access gate middleware, login flow, and the guarded endpoints.

pub mod app;
pub mod config;
pub mod context;
pub mod cookies;
pub mod extract;
pub mod middleware;

/// Session cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "_csrf_token";

/// Header echoing the CSRF token on login.
pub const CSRF_HEADER: &str = "x-csrftoken";
