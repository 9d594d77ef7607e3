//! `POST /_login`: exchanges a bearer credential for a credential cookie.
//!
//! The CSRF check runs before the credential is even looked at.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::app::AppState;
use crate::app::errors::LoginError;
use crate::cookies::{self, SetCookie};
use crate::extract;

pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, LoginError> {
    let header_token = extract::csrf_header(&headers);
    let cookie_token = extract::cookie_value(&headers, &state.cookies.csrf);
    if !state
        .csrf
        .validate(header_token.as_deref(), cookie_token.as_deref())
    {
        tracing::warn!("login rejected: CSRF token missing or mismatched");
        return Err(LoginError::CsrfMismatch);
    }

    let credential = extract::extract_bearer(&headers).ok_or(LoginError::MissingCredential)?;
    if !credential
        .as_str()
        .chars()
        .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\'))
    {
        return Err(LoginError::MalformedCredential);
    }

    let mut res = Json(json!({ "status": "ok" })).into_response();
    let session = SetCookie::session(&state.cookies.credential, credential.as_str())
        .secure(state.cookies.secure);
    cookies::append(&mut res, &session);
    // A decision minted for a previous credential must not outlive the login.
    cookies::append(&mut res, &SetCookie::removal(&state.cookies.decision));

    tracing::info!("login accepted");
    Ok(res)
}
