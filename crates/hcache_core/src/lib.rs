//! HTTP client-side cache.
//!
//! [`CacheHandler`] wraps any [`Transport`] and is itself a [`Transport`], so
//! it drops in wherever the plain network transport was used. Per call it
//! either serves a fresh stored response, fetches live and maybe stores the
//! result, or bypasses the cache entirely.

mod handler;
mod hyper_transport;
mod transport;

pub use handler::{
    CacheHandler, CacheOptions, CacheStatus, X_CACHE_ORIGIN, X_FROM_CACHE,
};
pub use hyper_transport::HyperTransport;
pub use transport::{Transport, TransportError};

pub use hcache_policy::{CacheKind, CachePolicy, Evaluation, Reason};
pub use hcache_store::{
    CacheKey, CacheStore, CachedEntry, DiskStore, Eviction, MemoryStore, MemoryStoreOptions,
    StoreError,
};
