//! Endpoints of the guarded resource.
//!
//! Handlers only run after the gate allowed the request.

use axum::{
    Extension, Json,
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::context::AccessContext;

pub async fn layout(Extension(access): Extension<AccessContext>) -> impl IntoResponse {
    Json(json!({
        "resource_id": access.resource_id(),
        "sharing": access.sharing(),
        "layout": { "type": "Div", "props": { "children": [] } },
    }))
}

pub async fn routes(Extension(access): Extension<AccessContext>) -> impl IntoResponse {
    Json(json!({ "resource_id": access.resource_id(), "routes": [] }))
}

pub async fn dependencies(Extension(access): Extension<AccessContext>) -> impl IntoResponse {
    Json(json!({ "resource_id": access.resource_id(), "dependencies": [] }))
}

pub async fn update_component(
    Extension(access): Extension<AccessContext>,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    Json(json!({ "resource_id": access.resource_id(), "response": body }))
}
