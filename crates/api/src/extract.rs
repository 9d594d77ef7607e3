//! Credential extraction from request headers and cookies.
//!
//! Pure functions of the incoming headers; nothing here mutates the request.

use axum::http::{HeaderMap, header};

use viewgate_auth::Credential;

use crate::config::CookieSettings;

/// Credential material found on a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedCredentials {
    pub credential: Option<Credential>,
    pub decision_cookie: Option<String>,
}

/// Credential cookie first (subsequent requests), then `Authorization: Bearer`
/// (login), plus the decision cookie if any.
pub fn extract(headers: &HeaderMap, cookies: &CookieSettings) -> ExtractedCredentials {
    let credential = cookie_value(headers, &cookies.credential)
        .and_then(Credential::new)
        .or_else(|| extract_bearer(headers));

    ExtractedCredentials {
        credential,
        decision_cookie: cookie_value(headers, &cookies.decision),
    }
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<Credential> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    Credential::new(token)
}

/// First non-empty value of cookie `name` across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.trim_matches('"').to_string())
}

pub fn csrf_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(crate::CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.append(k.clone(), HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn finds_cookies_across_headers() {
        let h = headers(&[
            (header::COOKIE, "a=1; viewgate_token=tok"),
            (header::COOKIE, "viewgate_access=v1.x.y"),
        ]);
        let got = extract(&h, &CookieSettings::default());

        assert_eq!(got.credential.unwrap().as_str(), "tok");
        assert_eq!(got.decision_cookie.as_deref(), Some("v1.x.y"));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc")]);
        assert_eq!(extract(&h, &CookieSettings::default()).credential.unwrap().as_str(), "abc");

        let h = headers(&[(header::AUTHORIZATION, "Basic abc")]);
        assert!(extract(&h, &CookieSettings::default()).credential.is_none());

        let h = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
        assert!(extract_bearer(&h).is_none());
    }

    #[test]
    fn empty_and_prefixed_names_do_not_match() {
        let h = headers(&[(header::COOKIE, "viewgate_token=; xviewgate_access=v1")]);
        let got = extract(&h, &CookieSettings::default());

        assert!(got.credential.is_none());
        assert!(got.decision_cookie.is_none());
    }

    #[test]
    fn reads_csrf_header() {
        let h = headers(&[(header::HeaderName::from_static(crate::CSRF_HEADER), " t0k ")]);
        assert_eq!(csrf_header(&h).as_deref(), Some("t0k"));
        assert!(csrf_header(&HeaderMap::new()).is_none());
    }
}
