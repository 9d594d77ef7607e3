//! HTTP API application wiring (Axum router + gate wiring).
//!
//! - `routes/`: HTTP handlers (resource endpoints, login, system)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::Router;
use chrono::Duration;
use tower::ServiceBuilder;

use viewgate_auth::{
    AccessGate, Clock, CsrfGuard, DecisionCodec, GateSettings, RemoteAuthority, SystemClock,
};
use viewgate_infra::authority::{HttpAuthority, HttpAuthorityError, InMemoryAuthority};

use crate::config::{CookieSettings, GateConfig};
use crate::middleware;

pub mod errors;
pub mod routes;

/// Shared, cheaply clonable request-handling state.
///
/// Holds no per-client data: the decision cache lives in client cookies.
#[derive(Clone)]
pub struct AppState {
    pub gate: AccessGate,
    pub csrf: CsrfGuard,
    pub cookies: Arc<CookieSettings>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: &GateConfig, authority: Arc<dyn RemoteAuthority>, clock: Arc<dyn Clock>) -> Self {
        let settings = GateSettings {
            resource_id: config.resource_id.clone(),
            protected: config.protected.clone(),
            permissions_cache_expiry: Duration::seconds(config.permissions_cache_expiry as i64),
            authority_timeout: config.authority_timeout,
            refresh_sharing_on_miss: config.refresh_sharing_on_miss,
        };
        let gate = AccessGate::new(
            settings,
            config.sharing,
            DecisionCodec::new(config.signing_secret.clone()),
            authority,
        );

        Self {
            gate,
            csrf: CsrfGuard::new(),
            cookies: Arc::new(config.cookies.clone()),
            clock,
        }
    }
}

/// Remote authority selected by configuration.
///
/// Without `VIEWGATE_AUTHORITY_URL` an empty in-memory authority is used,
/// which denies every non-public request.
pub fn build_authority(config: &GateConfig) -> Result<Arc<dyn RemoteAuthority>, HttpAuthorityError> {
    match &config.authority_url {
        Some(url) => {
            let mut authority = HttpAuthority::new(url.clone(), config.authority_timeout)?;
            if let Some(service) = &config.service_credential {
                authority = authority.with_service_credential(service.clone());
            }
            Ok(Arc::new(authority))
        }
        None => {
            tracing::warn!("VIEWGATE_AUTHORITY_URL not set; using in-memory authority (denies all)");
            Ok(Arc::new(InMemoryAuthority::new()))
        }
    }
}

/// Build the full HTTP router from prepared state (used by tests).
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::csrf_cookie_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::gate_middleware,
                )),
        )
        .with_state(state)
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &GateConfig) -> Result<Router, HttpAuthorityError> {
    let authority = build_authority(config)?;
    let state = AppState::new(config, authority, Arc::new(SystemClock));
    Ok(build_router(state))
}
