//! HTTP transport implementation.
//!
//! Talks to the mirror server's JSON endpoints with `reqwest`. Host ids and
//! filenames are pushed as individual URL path segments, so they are
//! percent-encoded rather than interpolated.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::MirrorTransport;
use async_trait::async_trait;
use bytes::Bytes;
use hostmirror_protocol::{CheckUpdatesRequest, ErrorBody, HostId, VersionMap};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;

/// HTTP-based mirror transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL of the mirror server (e.g., "http://mirror.example.com:8000").
    base_url: Url,
    /// HTTP client.
    client: Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the URL is invalid or the client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> SyncResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("invalid server url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "server url {base_url} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { base_url, client })
    }

    /// Creates a transport from a sync configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::new`].
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(&config.server_url, config.timeout)
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments.
    fn endpoint(&self, segments: &[&str]) -> SyncResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SyncError::Config(format!("server url {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Maps non-success statuses to errors.
    async fn check(response: Response) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());

        if status == StatusCode::NOT_FOUND {
            Err(SyncError::NotFound(message))
        } else {
            Err(SyncError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Extracts the message from an [`ErrorBody`], if the body is one.
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body).ok().map(|e| e.error)
}

fn transport_error(e: reqwest::Error) -> SyncError {
    if e.is_builder() {
        SyncError::transport_fatal(e.to_string())
    } else {
        SyncError::transport_retryable(e.to_string())
    }
}

#[async_trait]
impl MirrorTransport for HttpTransport {
    async fn fetch_versions(&self, host: &HostId) -> SyncResult<VersionMap> {
        let url = self.endpoint(&["versions", host.as_str()])?;
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let response = Self::check(response).await?;
        response
            .json::<VersionMap>()
            .await
            .map_err(|e| SyncError::Protocol(format!("failed to decode version map: {e}")))
    }

    async fn check_updates(&self, host: &HostId, files: &VersionMap) -> SyncResult<VersionMap> {
        let url = self.endpoint(&["check_updates"])?;
        let request = CheckUpdatesRequest::new(host.clone(), files.clone());
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check(response).await?;
        response
            .json::<VersionMap>()
            .await
            .map_err(|e| SyncError::Protocol(format!("failed to decode version map: {e}")))
    }

    async fn fetch_file(&self, host: &HostId, filename: &str) -> SyncResult<Bytes> {
        let url = self.endpoint(&["download", host.as_str(), filename])?;
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let response = Self::check(response).await?;
        response.bytes().await.map_err(transport_error)
    }
}
