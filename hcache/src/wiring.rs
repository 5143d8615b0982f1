use std::sync::Arc;
use std::time::Duration;

use hcache_config::{EvictionKind, HcacheConfig, StoreBackend};
use hcache_core::{
    CacheHandler, CacheOptions, CacheStore, DiskStore, Eviction, HyperTransport, MemoryStore,
    MemoryStoreOptions,
};
use tracing::info;

/// Build the storage backend selected by `[store]`.
pub fn build_store(cfg: &HcacheConfig) -> Arc<dyn CacheStore> {
    let store = cfg.store();
    match store.backend() {
        StoreBackend::Memory => {
            let eviction = match store.eviction() {
                EvictionKind::Lru => Eviction::Lru,
                EvictionKind::Lfu => Eviction::Lfu,
            };
            info!(
                target: "hcache::store",
                capacity = store.capacity(),
                ttl_secs = ?store.ttl_secs(),
                eviction = ?eviction,
                "Using memory store"
            );
            Arc::new(MemoryStore::with_options(MemoryStoreOptions {
                capacity: store.capacity(),
                ttl: store.ttl_secs().map(Duration::from_secs),
                eviction,
            }))
        }
        StoreBackend::Disk => {
            info!(target: "hcache::store", dir = store.dir(), "Using disk store");
            Arc::new(DiskStore::new(store.dir()))
        }
    }
}

pub fn build_transport(cfg: &HcacheConfig) -> HyperTransport {
    let client = cfg.client();
    HyperTransport::with_timeouts(
        client.connect_timeout_secs().map(Duration::from_secs),
        client.request_timeout_secs().map(Duration::from_secs),
    )
}

pub fn build_handler(cfg: &HcacheConfig) -> CacheHandler<HyperTransport> {
    let cache = cfg.cache();
    let options = CacheOptions {
        rfc_compliance: cache.rfc_compliance(),
        private_cache: cache.private_cache(),
        store_without_freshness: cache.store_without_freshness(),
    };
    CacheHandler::new(build_transport(cfg), build_store(cfg), options)
}

#[cfg(test)]
mod tests {
    use super::build_handler;
    use hcache_config::{HcacheConfig, StoreBackend};
    use hcache_core::CacheStore;

    #[test]
    fn memory_backend_by_default() {
        let handler = build_handler(&HcacheConfig::default());
        assert_eq!(handler.store().origin(), "MEMORY");
        assert!(handler.options().rfc_compliance);
    }

    #[test]
    fn disk_backend_from_config() {
        let mut cfg = HcacheConfig::default();
        cfg.store.backend = StoreBackend::Disk;
        cfg.cache.private_cache = false;
        let handler = build_handler(&cfg);
        assert_eq!(handler.store().origin(), "DISK");
        assert!(!handler.options().private_cache);
    }
}
