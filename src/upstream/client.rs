//! HTTP client for the upstream content origin

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use bon::Builder;
use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Failed to read body: {0}")]
    Body(String),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// HTTP client settings
#[derive(Debug, Clone, Builder)]
pub struct HttpSettings {
    #[builder(default = Duration::from_secs(10))]
    pub connect_timeout: Duration,
    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,
    /// Extra attempts after a network fault. Non-success statuses are never retried.
    #[builder(default = 0)]
    pub max_retries: u32,
    #[builder(default = default_user_agent())]
    pub user_agent: String,
    /// Ask every intermediate cache to skip this request
    #[builder(default = false)]
    pub bypass_cache: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub fn default_user_agent() -> String {
    format!("canoegate/{}", env!("CARGO_PKG_VERSION"))
}

/// Buffered upstream response, cheap to clone (body is refcounted)
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json(&self) -> std::result::Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Client bound to one base origin; paths are appended verbatim
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    settings: HttpSettings,
}

impl UpstreamClient {
    pub fn new(base_url: &str, settings: HttpSettings) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(UpstreamError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(&settings.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| UpstreamError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full upstream URL for an incoming path
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// GET `path` from the origin, retrying network faults up to `max_retries` times
    pub async fn get(&self, path: &str) -> Result<UpstreamResponse> {
        let url = self.url_for(path);
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.get_once(&url).await {
                Ok(response) => {
                    if attempts > 1 {
                        debug!(url, attempts, "Upstream fetch succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) if attempts > self.settings.max_retries => {
                    if self.settings.max_retries > 0 {
                        warn!(url, attempts, error = %e, "Upstream fetch failed after retries");
                    }
                    return Err(e);
                }
                Err(e) => {
                    warn!(url, attempts, error = %e, "Upstream fetch failed, retrying");

                    // 200ms, 400ms, 800ms, ...
                    let backoff = Duration::from_millis(200 * 2u64.pow((attempts - 1).min(6)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<UpstreamResponse> {
        debug!(url, "Fetching upstream");

        let mut request = self.client.get(url);
        if self.settings.bypass_cache {
            request = request
                .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
                .header(header::PRAGMA, HeaderValue::from_static("no-cache"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else if e.is_redirect() {
                UpstreamError::TooManyRedirects
            } else {
                UpstreamError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Body(e.to_string())
            }
        })?;

        debug!(url, status = status.as_u16(), size = body.len(), "Upstream responded");

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
