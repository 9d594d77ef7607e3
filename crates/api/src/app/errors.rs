use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use viewgate_auth::GateDenial;

/// Gate denial as an HTTP error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error(transparent)]
pub struct GateError(#[from] GateDenial);

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self.0 {
            GateDenial::Unauthenticated => json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "a credential is required for this endpoint",
            ),
            GateDenial::Forbidden => json_error(
                StatusCode::FORBIDDEN,
                "forbidden",
                "access to this resource was denied",
            ),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    #[error("missing or mismatched CSRF token")]
    CsrfMismatch,

    #[error("missing bearer credential")]
    MissingCredential,

    #[error("credential contains characters not allowed in a cookie")]
    MalformedCredential,
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        match self {
            LoginError::CsrfMismatch => {
                json_error(StatusCode::FORBIDDEN, "csrf_mismatch", self.to_string())
            }
            LoginError::MissingCredential => {
                json_error(StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string())
            }
            LoginError::MalformedCredential => {
                json_error(StatusCode::BAD_REQUEST, "malformed_credential", self.to_string())
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
