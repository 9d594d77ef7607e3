//! `Set-Cookie` rendering.

use axum::http::{HeaderValue, header};
use axum::response::Response;

/// A cookie to set on the response. All cookies are scoped to `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie<'a> {
    pub name: &'a str,
    pub value: &'a str,
    /// Seconds; `None` for a session cookie.
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub same_site: &'static str,
    pub secure: bool,
}

impl<'a> SetCookie<'a> {
    pub fn session(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            value,
            max_age: None,
            http_only: true,
            same_site: "Lax",
            secure: false,
        }
    }

    /// Expire `name` on the client.
    pub fn removal(name: &'a str) -> Self {
        Self {
            max_age: Some(0),
            ..Self::session(name, "")
        }
    }

    pub fn max_age(mut self, secs: i64) -> Self {
        self.max_age = Some(secs);
        self
    }

    pub fn readable_by_scripts(mut self) -> Self {
        self.http_only = false;
        self
    }

    pub fn same_site(mut self, value: &'static str) -> Self {
        self.same_site = value;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}={}; Path=/; SameSite={}", self.name, self.value, self.same_site);
        if let Some(age) = self.max_age {
            out.push_str(&format!("; Max-Age={age}"));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

fn header_value(cookie: &SetCookie<'_>) -> Option<HeaderValue> {
    match HeaderValue::from_str(&cookie.render()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(cookie = cookie.name, "dropping unrenderable cookie: {e}");
            None
        }
    }
}

pub fn append(res: &mut Response, cookie: &SetCookie<'_>) {
    if let Some(v) = header_value(cookie) {
        res.headers_mut().append(header::SET_COOKIE, v);
    }
}
