use crate::humanize::{ByteSize, HumanDuration};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Component type code -> upstream manifest path. Keys are strings because
    /// TOML table keys and environment overrides are.
    #[serde(default = "default_components")]
    pub components: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            features: FeatureConfig::default(),
            logging: LoggingConfig::default(),
            components: default_components(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: ByteSize,
    /// `msg` field of successful synthesized envelopes
    #[serde(default = "default_envelope_msg")]
    pub envelope_msg: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
            envelope_msg: default_envelope_msg(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_body_bytes() -> ByteSize {
    ByteSize(1024 * 1024) // 1 MB
}

fn default_envelope_msg() -> String {
    "AeraCanoeV2".to_string()
}

/// Upstream content origin
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    /// Extra attempts after a network fault (0 = fail on first fault)
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "crate::upstream::default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            max_retries: 0,
            user_agent: crate::upstream::default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://raw.githubusercontent.com/LuKazuu/EmulatorComponents/main".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

/// Response cache
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Freshness window of a cached upstream response
    #[serde(default = "default_cache_ttl")]
    pub ttl: HumanDuration,
    /// `max-age` advertised to clients in cached mode
    #[serde(default = "default_client_max_age")]
    pub client_max_age: HumanDuration,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: default_cache_ttl(),
            client_max_age: default_client_max_age(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_cache_ttl() -> HumanDuration {
    HumanDuration::from_secs(300)
}

fn default_client_max_age() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_max_entries() -> usize {
    1024
}

/// Optional capabilities
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureConfig {
    /// Expose `/simulator/v2/getComponentDetail`
    #[serde(default = "default_true")]
    pub component_detail: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            component_detail: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log URL and reason for every failed upstream fetch
    #[serde(default = "default_true")]
    pub verbose_failures: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose_failures: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_components() -> BTreeMap<String, String> {
    [
        ("1", "/components/box64_manifest"),
        ("2", "/components/drivers_manifest"),
        ("3", "/components/dxvk_manifest"),
        ("4", "/components/vkd3d_manifest"),
        ("5", "/components/games_manifest"),
        ("6", "/components/libraries_manifest"),
        ("7", "/components/steam_manifest"),
    ]
    .into_iter()
    .map(|(code, path)| (code.to_string(), path.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.server.max_body_bytes.as_u64(), 1024 * 1024);
        assert_eq!(config.server.envelope_msg, "AeraCanoeV2");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl.as_secs(), 300);
        assert_eq!(config.cache.client_max_age.as_secs(), 60);
        assert!(config.features.component_detail);
        assert_eq!(config.components.len(), 7);
        assert_eq!(config.components["3"], "/components/dxvk_manifest");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[cache]
enabled = true
ttl = "2m"

[components]
1 = "/components/only_manifest"
            "#,
        )
        .unwrap();

        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl.as_secs(), 120);
        assert_eq!(config.cache.max_entries, 1024);
        assert_eq!(config.components.len(), 1);
        assert_eq!(config.upstream.max_retries, 0);
    }
}
