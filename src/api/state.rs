use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::headers::ResponseHeaders;
use super::routes::{RouteOptions, RouteTable};
use crate::cache::MemoryCacheStore;
use crate::config::{Config, ConfigError};
use crate::manifest::ComponentRegistry;
use crate::observability::Metrics;
use crate::upstream::{CacheLayer, Upstream, UpstreamClient, UpstreamError};

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to build upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ComponentRegistry>,
    pub upstream: Arc<Upstream>,
    pub routes: Arc<RouteTable>,
    pub headers: Arc<ResponseHeaders>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire the registry, upstream client, optional cache and route table from `config`
    pub fn from_config(config: Config) -> Result<Self, StateError> {
        let registry = config.component_registry()?;
        let metrics = Arc::new(Metrics::new());

        let client = UpstreamClient::new(&config.upstream.base_url, config.http_settings())?;
        let cache = config.cache.enabled.then(|| {
            let ttl = config.cache.ttl.as_duration();
            let store = MemoryCacheStore::new(ttl, config.cache.max_entries);
            CacheLayer::new(Arc::new(store), ttl)
        });

        let upstream = Upstream::new(client, cache, Arc::clone(&metrics))
            .with_verbose_failures(config.logging.verbose_failures);

        let routes = RouteTable::new(RouteOptions {
            component_detail: config.features.component_detail,
        });
        let headers =
            ResponseHeaders::for_mode(upstream.mode(), config.cache.client_max_age.as_duration());

        info!(
            mode = ?upstream.mode(),
            origin = %upstream.client().base_url(),
            components = registry.len(),
            component_detail = config.features.component_detail,
            "Proxy state initialised"
        );

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            upstream: Arc::new(upstream),
            routes: Arc::new(routes),
            headers: Arc::new(headers),
            metrics,
        })
    }
}
