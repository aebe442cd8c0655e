//! Configuration management for canoegate
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use canoegate::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Proxying {}", config.upstream.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `CANOEGATE__<section>__<key>`
//!
//! Examples:
//! - `CANOEGATE__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `CANOEGATE__CACHE__ENABLED=true`
//! - `CANOEGATE__CACHE__TTL=10m`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/canoegate.toml`.
//! This can be overridden using the `CANOEGATE_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{
    CacheConfig, Config, FeatureConfig, LoggingConfig, ServerConfig, UpstreamConfig,
};
pub use validation::ValidationError;

use crate::manifest::ComponentRegistry;
use crate::upstream::HttpSettings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }

    /// Immutable type-code registry built from `[components]`
    pub fn component_registry(&self) -> Result<ComponentRegistry, ConfigError> {
        ComponentRegistry::from_config(&self.components)
            .map_err(|e| ConfigError::ValidationError(e.into()))
    }

    /// Client settings for the upstream origin. Uncached mode asks every layer
    /// not to cache.
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings::builder()
            .connect_timeout(self.upstream.connect_timeout.as_duration())
            .request_timeout(self.upstream.request_timeout.as_duration())
            .max_retries(self.upstream.max_retries)
            .user_agent(self.upstream.user_agent.clone())
            .bypass_cache(!self.cache.enabled)
            .build()
    }
}
