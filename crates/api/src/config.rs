//! Configuration loaded from environment variables.
//!
//! | variable | default |
//! |----------|---------|
//! | `VIEWGATE_RESOURCE_ID` | `local:0` |
//! | `VIEWGATE_SHARING` | `private` |
//! | `VIEWGATE_PERMISSIONS_CACHE_EXPIRY` | `300` (seconds) |
//! | `VIEWGATE_SIGNING_SECRET` | insecure dev default (warns) |
//! | `VIEWGATE_DECISION_COOKIE` | `viewgate_access` |
//! | `VIEWGATE_CREDENTIAL_COOKIE` | `viewgate_token` |
//! | `VIEWGATE_SECURE_COOKIES` | `false` |
//! | `VIEWGATE_PROTECTED` | `/layout,/routes,/dependencies,/update-component` |
//! | `VIEWGATE_AUTHORITY_URL` | unset: in-memory authority (denies everything) |
//! | `VIEWGATE_AUTHORITY_TIMEOUT_MS` | `5000` |
//! | `VIEWGATE_SERVICE_TOKEN` | unset: sharing lookups disabled |
//! | `VIEWGATE_REFRESH_SHARING` | `true` |
//! | `VIEWGATE_BIND` | `0.0.0.0:8080` |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use viewgate_auth::{Credential, ProtectedEndpoints, SigningKey};
use viewgate_core::{ResourceId, SharingLevel};

pub const DEFAULT_PROTECTED: [&str; 4] = ["/layout", "/routes", "/dependencies", "/update-component"];
pub const DEFAULT_CACHE_EXPIRY_SECS: u64 = 300;
pub const MAX_CACHE_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;
pub const MIN_SECRET_BYTES: usize = 16;

const DEV_SIGNING_SECRET: &str = "viewgate-insecure-dev-signing-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Cookie names and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub credential: String,
    pub decision: String,
    pub csrf: String,
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            credential: "viewgate_token".to_string(),
            decision: "viewgate_access".to_string(),
            csrf: crate::CSRF_COOKIE.to_string(),
            secure: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub resource_id: ResourceId,
    pub sharing: SharingLevel,
    /// TTL (seconds) of every newly minted decision cookie.
    pub permissions_cache_expiry: u64,
    pub signing_secret: SigningKey,
    pub cookies: CookieSettings,
    pub protected: ProtectedEndpoints,
    pub authority_url: Option<String>,
    pub authority_timeout: Duration,
    pub service_credential: Option<Credential>,
    pub refresh_sharing_on_miss: bool,
    pub bind: SocketAddr,
}

impl GateConfig {
    pub fn new(resource_id: ResourceId, sharing: SharingLevel, signing_secret: SigningKey) -> Self {
        Self {
            resource_id,
            sharing,
            permissions_cache_expiry: DEFAULT_CACHE_EXPIRY_SECS,
            signing_secret,
            cookies: CookieSettings::default(),
            protected: ProtectedEndpoints::new(DEFAULT_PROTECTED),
            authority_url: None,
            authority_timeout: Duration::from_millis(5000),
            service_credential: None,
            refresh_sharing_on_miss: true,
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }

    pub fn with_cache_expiry(mut self, secs: u64) -> Self {
        self.permissions_cache_expiry = secs;
        self
    }

    pub fn with_refresh_sharing(mut self, enabled: bool) -> Self {
        self.refresh_sharing_on_miss = enabled;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let resource_id = match get("VIEWGATE_RESOURCE_ID") {
            Some(v) => v
                .parse()
                .map_err(|e| ConfigError::invalid("VIEWGATE_RESOURCE_ID", format!("{e}")))?,
            None => ResourceId::new("local:0")
                .map_err(|e| ConfigError::invalid("VIEWGATE_RESOURCE_ID", format!("{e}")))?,
        };

        let sharing = match get("VIEWGATE_SHARING") {
            Some(v) => v
                .parse()
                .map_err(|e| ConfigError::invalid("VIEWGATE_SHARING", format!("{e}")))?,
            None => SharingLevel::default(),
        };

        let signing_secret = match get("VIEWGATE_SIGNING_SECRET") {
            Some(v) if v.len() < MIN_SECRET_BYTES => {
                return Err(ConfigError::invalid(
                    "VIEWGATE_SIGNING_SECRET",
                    format!("must be at least {MIN_SECRET_BYTES} bytes"),
                ));
            }
            Some(v) => SigningKey::new(v.into_bytes()),
            None => {
                tracing::warn!("VIEWGATE_SIGNING_SECRET not set; using insecure dev default");
                SigningKey::new(DEV_SIGNING_SECRET.as_bytes().to_vec())
            }
        };

        let mut config = Self::new(resource_id, sharing, signing_secret);

        if let Some(v) = get("VIEWGATE_PERMISSIONS_CACHE_EXPIRY") {
            let secs: u64 = v.parse().map_err(|_| {
                ConfigError::invalid("VIEWGATE_PERMISSIONS_CACHE_EXPIRY", "expected whole seconds")
            })?;
            if secs == 0 || secs > MAX_CACHE_EXPIRY_SECS {
                return Err(ConfigError::invalid(
                    "VIEWGATE_PERMISSIONS_CACHE_EXPIRY",
                    format!("must be between 1 and {MAX_CACHE_EXPIRY_SECS}"),
                ));
            }
            config.permissions_cache_expiry = secs;
        }

        if let Some(v) = get("VIEWGATE_DECISION_COOKIE") {
            config.cookies.decision = cookie_name("VIEWGATE_DECISION_COOKIE", v)?;
        }
        if let Some(v) = get("VIEWGATE_CREDENTIAL_COOKIE") {
            config.cookies.credential = cookie_name("VIEWGATE_CREDENTIAL_COOKIE", v)?;
        }
        if let Some(v) = get("VIEWGATE_SECURE_COOKIES") {
            config.cookies.secure = parse_bool("VIEWGATE_SECURE_COOKIES", &v)?;
        }

        if let Some(v) = get("VIEWGATE_PROTECTED") {
            let paths: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if let Some(bad) = paths.iter().find(|p| !p.starts_with('/')) {
                return Err(ConfigError::invalid(
                    "VIEWGATE_PROTECTED",
                    format!("path {bad:?} must start with '/'"),
                ));
            }
            config.protected = ProtectedEndpoints::new(paths);
        }

        config.authority_url = get("VIEWGATE_AUTHORITY_URL");
        if let Some(v) = get("VIEWGATE_AUTHORITY_TIMEOUT_MS") {
            let ms: u64 = v.parse().map_err(|_| {
                ConfigError::invalid("VIEWGATE_AUTHORITY_TIMEOUT_MS", "expected milliseconds")
            })?;
            if ms == 0 {
                return Err(ConfigError::invalid("VIEWGATE_AUTHORITY_TIMEOUT_MS", "must be > 0"));
            }
            config.authority_timeout = Duration::from_millis(ms);
        }
        config.service_credential = get("VIEWGATE_SERVICE_TOKEN").and_then(Credential::new);
        if let Some(v) = get("VIEWGATE_REFRESH_SHARING") {
            config.refresh_sharing_on_miss = parse_bool("VIEWGATE_REFRESH_SHARING", &v)?;
        }
        if config.refresh_sharing_on_miss
            && config.authority_url.is_some()
            && config.service_credential.is_none()
        {
            tracing::warn!(
                "VIEWGATE_SERVICE_TOKEN not set; sharing level will not be refreshed from the authority"
            );
            config.refresh_sharing_on_miss = false;
        }

        if let Some(v) = get("VIEWGATE_BIND") {
            config.bind = v
                .parse()
                .map_err(|e| ConfigError::invalid("VIEWGATE_BIND", format!("{e}")))?;
        }

        Ok(config)
    }
}

fn parse_bool(var: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, format!("expected a boolean, got {v:?}"))),
    }
}

fn cookie_name(var: &'static str, v: String) -> Result<String, ConfigError> {
    let valid = v
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(ConfigError::invalid(var, format!("invalid cookie name {v:?}")));
    }
    Ok(v)
}
