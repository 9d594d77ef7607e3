use axum::{
    Router,
    routing::{get, post},
};

use crate::app::AppState;

pub mod login;
pub mod resource;
pub mod system;

/// Router for every endpoint; the gate middleware decides which are protected.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(system::index))
        .route("/health", get(system::health))
        .route("/_config", get(system::config))
        .route("/_metrics", get(system::metrics))
        .route("/component-suites/*path", get(system::component_suite))
        .route("/_login", post(login::login))
        .route("/layout", get(resource::layout))
        .route("/routes", get(resource::routes))
        .route("/dependencies", get(resource::dependencies))
        .route("/update-component", post(resource::update_component))
}
