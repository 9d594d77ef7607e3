use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use viewgate_auth::{GateRequest, Verdict};

use crate::app::AppState;
use crate::app::errors::GateError;
use crate::context::AccessContext;
use crate::cookies::{self, SetCookie};
use crate::extract;

/// Runs the access gate for every request.
///
/// Unprotected paths pass straight through (the gate decides that, not the
/// router). On a remote grant the freshly minted decision cookie is attached
/// to the downstream response.
pub async fn gate_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let found = extract::extract(req.headers(), &state.cookies);
    let path = req.uri().path().to_string();
    let now = state.clock.now();

    let evaluation = state
        .gate
        .evaluate(GateRequest {
            path: &path,
            credential: found.credential.as_ref(),
            decision_cookie: found.decision_cookie.as_deref(),
            now,
        })
        .await;

    match evaluation.verdict {
        Verdict::Allow => {
            req.extensions_mut().insert(AccessContext::new(
                state.gate.settings().resource_id.clone(),
                state.gate.sharing_at(now),
            ));
            let mut res = next.run(req).await;
            if let Some(minted) = evaluation.minted {
                let cookie = SetCookie::session(&state.cookies.decision, &minted.cookie_value)
                    .max_age(minted.max_age.num_seconds())
                    .secure(state.cookies.secure);
                cookies::append(&mut res, &cookie);
            }
            res
        }
        Verdict::Deny(denial) => GateError::from(denial).into_response(),
    }
}

/// Issues a CSRF session cookie to any client that does not have one yet, so
/// a token is available before login.
pub async fn csrf_cookie_middleware(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let has_token = extract::cookie_value(req.headers(), &state.cookies.csrf).is_some();
    let mut res = next.run(req).await;

    if !has_token {
        let token = state.csrf.issue();
        let cookie = SetCookie::session(&state.cookies.csrf, token.as_str())
            .readable_by_scripts()
            .same_site("Strict")
            .secure(state.cookies.secure);
        cookies::append(&mut res, &cookie);
    }
    res
}
