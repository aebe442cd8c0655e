//! Upstream access: the raw HTTP client plus the optional cache in front of it
//!
//! [`Upstream::fetch`] is the single entry point used by every route. In
//! [`ProxyMode::Uncached`] it goes straight to the origin with no-cache request
//! directives; in [`ProxyMode::Cached`] it consults the cache first and populates
//! it in the background after a successful miss.

mod client;

pub use client::{
    HttpSettings, Result, UpstreamClient, UpstreamError, UpstreamResponse, default_user_agent,
};

use axum::http::{HeaderValue, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{BackgroundWrites, CacheKey, CacheStore};
use crate::observability::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
    Uncached,
    Cached,
}

/// Cache wiring for [`ProxyMode::Cached`]
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }
}

pub struct Upstream {
    client: UpstreamClient,
    cache: Option<CacheLayer>,
    writes: BackgroundWrites,
    metrics: Arc<Metrics>,
    verbose_failures: bool,
}

impl Upstream {
    pub fn new(client: UpstreamClient, cache: Option<CacheLayer>, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            cache,
            writes: BackgroundWrites::new(),
            metrics,
            verbose_failures: false,
        }
    }

    /// Log the upstream URL and reason for every failed fetch
    pub fn with_verbose_failures(mut self, verbose: bool) -> Self {
        self.verbose_failures = verbose;
        self
    }

    pub fn mode(&self) -> ProxyMode {
        if self.cache.is_some() {
            ProxyMode::Cached
        } else {
            ProxyMode::Uncached
        }
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Number of cache writes spawned but not yet reaped
    pub fn pending_writes(&self) -> usize {
        self.writes.pending()
    }

    /// Wait for all background cache writes to land
    pub async fn drain_background(&self) {
        self.writes.drain().await;
    }

    /// Fetch `path` from the origin, through the cache when one is configured.
    ///
    /// Non-success statuses are returned as responses; only network-level faults
    /// are errors.
    pub async fn fetch(&self, path: &str) -> Result<UpstreamResponse> {
        let Some(cache) = &self.cache else {
            return self.fetch_origin(path).await;
        };

        let key = CacheKey::get(self.client.url_for(path));
        if let Some(hit) = cache.store.lookup(&key).await {
            self.metrics.cache_hit();
            debug!(%key, "Cache hit");
            return Ok(hit);
        }
        self.metrics.cache_miss();

        let response = self.fetch_origin(path).await?;
        if response.is_success() {
            self.populate(cache, key, response.clone());
        }
        Ok(response)
    }

    async fn fetch_origin(&self, path: &str) -> Result<UpstreamResponse> {
        self.metrics.upstream_fetch();

        match self.client.get(path).await {
            Ok(response) => {
                if !response.is_success() {
                    self.metrics.upstream_failure();
                    if self.verbose_failures {
                        warn!(
                            url = %self.client.url_for(path),
                            status = response.status.as_u16(),
                            "Upstream returned non-success status"
                        );
                    }
                }
                Ok(response)
            }
            Err(e) => {
                self.metrics.upstream_failure();
                if self.verbose_failures {
                    warn!(url = %self.client.url_for(path), error = %e, "Upstream fetch failed");
                }
                Err(e)
            }
        }
    }

    /// Store a copy of `response` without holding up the caller
    fn populate(&self, cache: &CacheLayer, key: CacheKey, mut response: UpstreamResponse) {
        let directive = format!("public, max-age={}", cache.ttl.as_secs());
        if let Ok(value) = HeaderValue::from_str(&directive) {
            response.headers.insert(header::CACHE_CONTROL, value);
        }

        let store = Arc::clone(&cache.store);
        let metrics = Arc::clone(&self.metrics);
        self.writes.spawn(async move {
            debug!(%key, "Writing cache entry");
            store.store(key, response).await;
            metrics.cache_write();
        });
    }
}
