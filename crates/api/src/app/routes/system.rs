use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use serde_json::json;

use crate::app::AppState;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><head><title>{}</title></head><body><div id=\"react-entry-point\"></div></body></html>",
        state.gate.settings().resource_id
    ))
}

/// Non-secret view of the gate configuration.
pub async fn config(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.gate.settings();
    let mut protected: Vec<&str> = settings.protected.iter().collect();
    protected.sort_unstable();

    Json(json!({
        "resource_id": settings.resource_id,
        "sharing": state.gate.sharing_at(state.clock.now()),
        "permissions_cache_expiry": settings.permissions_cache_expiry.num_seconds(),
        "protected": protected,
        "cookies": {
            "credential": state.cookies.credential,
            "decision": state.cookies.decision,
            "csrf": state.cookies.csrf,
        },
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.gate.metrics().snapshot())
}

pub async fn component_suite(Path(path): Path<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        format!("/* component suite: {path} */\n"),
    )
}
