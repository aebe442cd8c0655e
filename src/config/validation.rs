use super::models::Config;
use crate::manifest::{ComponentRegistry, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid component registry: {0}")]
    InvalidRegistry(#[from] RegistryError),

    #[error("Invalid upstream base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Cache TTL must be positive when the cache is enabled")]
    ZeroCacheTtl,

    #[error("Cache max_entries must be positive")]
    ZeroCacheCapacity,

    #[error("Upstream {field} must be positive")]
    ZeroTimeout { field: &'static str },

    #[error("max_body_bytes must be positive")]
    ZeroBodyLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_components(config)?;
    validate_upstream(config)?;
    validate_cache(config)?;
    validate_server(config)?;
    Ok(())
}

/// Registry keys must be positive integers and paths absolute
fn validate_components(config: &Config) -> Result<(), ValidationError> {
    ComponentRegistry::from_config(&config.components)?;
    Ok(())
}

fn validate_upstream(config: &Config) -> Result<(), ValidationError> {
    let url = &config.upstream.base_url;
    let parsed = reqwest::Url::parse(url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidBaseUrl {
            url: url.clone(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    if config.upstream.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "connect_timeout",
        });
    }
    if config.upstream.request_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "request_timeout",
        });
    }

    Ok(())
}

fn validate_cache(config: &Config) -> Result<(), ValidationError> {
    if config.cache.enabled && config.cache.ttl.is_zero() {
        return Err(ValidationError::ZeroCacheTtl);
    }
    if config.cache.max_entries == 0 {
        return Err(ValidationError::ZeroCacheCapacity);
    }
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_body_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroBodyLimit);
    }
    Ok(())
}
