use async_trait::async_trait;
use axum::http::Method;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::upstream::UpstreamResponse;

/// Upstream request identity: method plus full URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    url: String,
}

impl CacheKey {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Response store consulted before upstream fetches
///
/// Implementations must tolerate concurrent readers and writers; conflicting
/// writes to one key are last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fresh entry for `key`, or `None` on a miss or an expired entry
    async fn lookup(&self, key: &CacheKey) -> Option<UpstreamResponse>;

    /// Insert or replace the entry for `key`
    async fn store(&self, key: CacheKey, response: UpstreamResponse);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: UpstreamResponse,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process TTL cache with a capacity bound
///
/// Expired entries stay in place until they are overwritten or the store reaches
/// capacity, at which point expired entries are purged and, if still full, the
/// entry closest to expiry is dropped.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryCacheStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn make_room(entries: &mut HashMap<CacheKey, CacheEntry>, max_entries: usize, now: Instant) {
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        if before != entries.len() {
            debug!(purged = before - entries.len(), "Purged expired cache entries");
        }

        if entries.len() >= max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                debug!(%key, "Evicting cache entry at capacity");
                entries.remove(&key);
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn lookup(&self, key: &CacheKey) -> Option<UpstreamResponse> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.is_fresh(Instant::now()) {
            Some(entry.response.clone())
        } else {
            debug!(%key, "Cache entry expired");
            None
        }
    }

    async fn store(&self, key: CacheKey, response: UpstreamResponse) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            Self::make_room(&mut entries, self.max_entries, now);
        }

        entries.insert(
            key,
            CacheEntry {
                response,
                expires_at: now + self.ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use bytes::Bytes;

    fn response(body: &'static str) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_cache_key_identity() {
        let a = CacheKey::get("https://origin/x");
        let b = CacheKey::new(Method::GET, "https://origin/x");
        let c = CacheKey::new(Method::HEAD, "https://origin/x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "GET https://origin/x");
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let store = MemoryCacheStore::new(Duration::from_secs(60), 8);
        let key = CacheKey::get("https://origin/a");

        assert!(store.lookup(&key).await.is_none());
        store.store(key.clone(), response("a")).await;

        let hit = store.lookup(&key).await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"a"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_gets_replaced() {
        let store = MemoryCacheStore::new(Duration::from_millis(30), 8);
        let key = CacheKey::get("https://origin/a");

        store.store(key.clone(), response("old")).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.lookup(&key).await.is_none());

        store.store(key.clone(), response("new")).await;
        assert_eq!(store.lookup(&key).await.unwrap().body, Bytes::from_static(b"new"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryCacheStore::new(Duration::from_secs(60), 8);
        let key = CacheKey::get("https://origin/a");

        store.store(key.clone(), response("first")).await;
        store.store(key.clone(), response("second")).await;
        assert_eq!(store.lookup(&key).await.unwrap().body, Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn test_capacity_bound() {
        let store = MemoryCacheStore::new(Duration::from_secs(60), 2);

        store.store(CacheKey::get("https://origin/1"), response("1")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.store(CacheKey::get("https://origin/2"), response("2")).await;
        store.store(CacheKey::get("https://origin/3"), response("3")).await;

        assert_eq!(store.len().await, 2);
        assert!(store.lookup(&CacheKey::get("https://origin/1")).await.is_none());
        assert!(store.lookup(&CacheKey::get("https://origin/3")).await.is_some());
    }
}
