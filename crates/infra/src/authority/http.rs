//! HTTP client for the remote permission service.
//!
//! Both operations read `GET {base}/v2/files/{resource_id}`:
//! - view access: with the caller's bearer credential; 200 means granted,
//!   403/404 mean denied, 401 means the credential itself was rejected.
//! - sharing: with the service credential; the body's `world_readable` and
//!   `share_key_enabled` flags determine the level.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use viewgate_auth::{AuthorityError, Credential, RemoteAuthority};
use viewgate_core::{ResourceId, SharingLevel};

#[derive(Debug, Error)]
pub enum HttpAuthorityError {
    #[error("invalid authority base url: {0}")]
    InvalidBaseUrl(String),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    #[serde(default)]
    world_readable: bool,
    #[serde(default)]
    share_key_enabled: bool,
}

impl FileMetadata {
    fn sharing(&self) -> SharingLevel {
        if self.world_readable {
            SharingLevel::Public
        } else if self.share_key_enabled {
            SharingLevel::Secret
        } else {
            SharingLevel::Private
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: reqwest::Client,
    base_url: String,
    service_credential: Option<Credential>,
}

impl HttpAuthority {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, HttpAuthorityError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HttpAuthorityError::InvalidBaseUrl(base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            service_credential: None,
        })
    }

    /// Credential used for sharing lookups (not tied to any end user).
    pub fn with_service_credential(mut self, credential: Credential) -> Self {
        self.service_credential = Some(credential);
        self
    }

    fn file_url(&self, resource: &ResourceId) -> String {
        format!("{}/v2/files/{}", self.base_url, resource)
    }

    async fn get_file(
        &self,
        credential: &Credential,
        resource: &ResourceId,
    ) -> Result<reqwest::Response, AuthorityError> {
        self.client
            .get(self.file_url(resource))
            .bearer_auth(credential.as_str())
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(resource = %resource, "authority request failed: {e}");
                if e.is_timeout() {
                    AuthorityError::Unavailable("request timed out".to_string())
                } else {
                    AuthorityError::Unavailable(e.to_string())
                }
            })
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn check_view_access(
        &self,
        credential: &Credential,
        resource: &ResourceId,
    ) -> Result<bool, AuthorityError> {
        let res = self.get_file(credential, resource).await?;
        match res.status() {
            StatusCode::OK => Ok(true),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(false),
            StatusCode::UNAUTHORIZED => Err(AuthorityError::InvalidCredential),
            other => {
                tracing::debug!(resource = %resource, status = %other, "unexpected authority status");
                Err(AuthorityError::Unavailable(format!(
                    "unexpected authority status {other}"
                )))
            }
        }
    }

    async fn current_sharing(&self, resource: &ResourceId) -> Result<SharingLevel, AuthorityError> {
        let Some(service) = self.service_credential.as_ref() else {
            return Err(AuthorityError::Unavailable(
                "no service credential configured for sharing lookups".to_string(),
            ));
        };

        let res = self.get_file(service, resource).await?;
        if res.status() != StatusCode::OK {
            return Err(AuthorityError::Unavailable(format!(
                "sharing lookup returned {}",
                res.status()
            )));
        }

        let meta: FileMetadata = res
            .json()
            .await
            .map_err(|e| AuthorityError::Unavailable(format!("bad sharing payload: {e}")))?;
        let level = meta.sharing();
        tracing::debug!(resource = %resource, sharing = %level, "sharing level fetched");
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::get,
    };
    use serde_json::json;

    /// Fake permission service: `owner` sees everything, `viewer` nothing,
    /// `malformed` is rejected; file `slow:1` never answers in time.
    async fn files(Path(id): Path<String>, headers: HeaderMap) -> (AxumStatus, Json<serde_json::Value>) {
        if id == "slow:1" {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();

        match token {
            "owner" | "service" => (
                AxumStatus::OK,
                Json(json!({ "world_readable": id == "pub:1", "share_key_enabled": id == "sec:1" })),
            ),
            "malformed" => (AxumStatus::UNAUTHORIZED, Json(json!({}))),
            "boom" => (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({}))),
            _ => (AxumStatus::NOT_FOUND, Json(json!({}))),
        }
    }

    async fn spawn() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new().route("/v2/files/:id", get(files));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), handle)
    }

    fn rid(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn cred(s: &str) -> Credential {
        Credential::new(s).unwrap()
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            HttpAuthority::new("ftp://example.com", Duration::from_secs(1)),
            Err(HttpAuthorityError::InvalidBaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn maps_statuses_to_decisions() {
        let (base, handle) = spawn().await;
        let authority = HttpAuthority::new(base, Duration::from_secs(1)).unwrap();
        let r = rid("priv:1");

        assert!(authority.check_view_access(&cred("owner"), &r).await.unwrap());
        assert!(!authority.check_view_access(&cred("viewer"), &r).await.unwrap());
        assert_eq!(
            authority.check_view_access(&cred("malformed"), &r).await,
            Err(AuthorityError::InvalidCredential)
        );
        assert!(matches!(
            authority.check_view_access(&cred("boom"), &r).await,
            Err(AuthorityError::Unavailable(_))
        ));

        handle.abort();
    }

    #[tokio::test]
    async fn timeout_is_unavailable() {
        let (base, handle) = spawn().await;
        let authority = HttpAuthority::new(base, Duration::from_millis(100)).unwrap();

        assert!(matches!(
            authority.check_view_access(&cred("owner"), &rid("slow:1")).await,
            Err(AuthorityError::Unavailable(_))
        ));

        handle.abort();
    }

    #[tokio::test]
    async fn sharing_lookup_reads_file_flags() {
        let (base, handle) = spawn().await;
        let authority = HttpAuthority::new(base.clone(), Duration::from_secs(1))
            .unwrap()
            .with_service_credential(cred("service"));

        assert_eq!(authority.current_sharing(&rid("pub:1")).await.unwrap(), SharingLevel::Public);
        assert_eq!(authority.current_sharing(&rid("sec:1")).await.unwrap(), SharingLevel::Secret);
        assert_eq!(authority.current_sharing(&rid("priv:1")).await.unwrap(), SharingLevel::Private);

        let anonymous = HttpAuthority::new(base, Duration::from_secs(1)).unwrap();
        assert!(anonymous.current_sharing(&rid("pub:1")).await.is_err());

        handle.abort();
    }
}
