use std::time::Duration;

use async_trait::async_trait;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::debug;

use crate::{CacheKey, CacheStore, CachedEntry, StoreError};

/// Default item-count ceiling for the in-memory backend.
pub const DEFAULT_CAPACITY: u64 = 100;

const ORIGIN: &str = "MEMORY";

/// Replacement algorithm once the store is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eviction {
    #[default]
    Lru,
    Lfu,
}

#[derive(Debug, Clone)]
pub struct MemoryStoreOptions {
    pub capacity: u64,
    /// Backend-side time to live, independent of HTTP freshness.
    pub ttl: Option<Duration>,
    pub eviction: Eviction,
}

impl Default for MemoryStoreOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: None,
            eviction: Eviction::Lru,
        }
    }
}

/// Bounded in-process store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<CacheKey, CachedEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_options(MemoryStoreOptions::default())
    }

    pub fn with_options(options: MemoryStoreOptions) -> Self {
        let policy = match options.eviction {
            Eviction::Lru => EvictionPolicy::lru(),
            Eviction::Lfu => EvictionPolicy::tiny_lfu(),
        };

        let mut builder = Cache::builder()
            .max_capacity(options.capacity)
            .eviction_policy(policy);
        if let Some(ttl) = options.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            inner: builder.build(),
        }
    }

    /// Number of live entries, after pending evictions are applied.
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<CachedEntry, StoreError> {
        self.inner.get(key).ok_or(StoreError::NotFound)
    }

    async fn set(&self, key: &CacheKey, entry: CachedEntry) -> Result<(), StoreError> {
        debug!(target: "hcache::store", cache_key = %key, layer = "memory", "Storing entry");
        self.inner.insert(key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), StoreError> {
        self.inner.invalidate(key);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.inner.invalidate_all();
        Ok(())
    }

    fn origin(&self) -> &str {
        ORIGIN
    }
}

#[cfg(test)]
mod tests {
    use super::{Eviction, MemoryStore, MemoryStoreOptions};
    use crate::{CacheKey, CacheStore, CachedEntry, StoreError};
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use std::time::Duration;

    fn entry(body: &'static str) -> CachedEntry {
        CachedEntry::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(body.as_bytes()))
    }

    #[tokio::test]
    async fn get_after_set_returns_entry() {
        let store = MemoryStore::new();
        let key = CacheKey::new("GET", "http://example.com/");
        store.set(&key, entry("one")).await.expect("set");

        let got = store.get(&key).await.expect("get");
        assert_eq!(got.body.as_ref(), b"one");
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .get(&CacheKey::new("GET", "http://example.com/none"))
            .await
            .expect_err("expected miss");
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn set_replaces_whole_entry() {
        let store = MemoryStore::new();
        let key = CacheKey::new("GET", "http://example.com/");
        store.set(&key, entry("old")).await.expect("set");
        store.set(&key, entry("new")).await.expect("set");
        assert_eq!(store.get(&key).await.expect("get").body.as_ref(), b"new");
    }

    #[tokio::test]
    async fn delete_and_flush_remove_entries() {
        let store = MemoryStore::new();
        let a = CacheKey::new("GET", "http://example.com/a");
        let b = CacheKey::new("GET", "http://example.com/b");
        store.set(&a, entry("a")).await.expect("set");
        store.set(&b, entry("b")).await.expect("set");

        store.delete(&a).await.expect("delete");
        assert!(store.get(&a).await.is_err());
        assert!(store.get(&b).await.is_ok());

        store.flush().await.expect("flush");
        assert!(store.get(&b).await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn capacity_bounds_entry_count() {
        let store = MemoryStore::with_options(MemoryStoreOptions {
            capacity: 2,
            ttl: None,
            eviction: Eviction::Lru,
        });
        for i in 0..10 {
            let key = CacheKey::new("GET", &format!("http://example.com/{i}"));
            store.set(&key, entry("x")).await.expect("set");
        }
        assert!(store.len() <= 2);
    }

    #[tokio::test]
    async fn backend_ttl_expires_entries() {
        let store = MemoryStore::with_options(MemoryStoreOptions {
            ttl: Some(Duration::from_millis(50)),
            ..MemoryStoreOptions::default()
        });
        let key = CacheKey::new("GET", "http://example.com/");
        store.set(&key, entry("x")).await.expect("set");
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.get(&key).await.is_err());
    }

    #[test]
    fn origin_label() {
        assert_eq!(MemoryStore::new().origin(), "MEMORY");
    }
}
