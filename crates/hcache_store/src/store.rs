use async_trait::async_trait;

use crate::{CacheKey, CachedEntry, StoreError};

/// Storage contract consumed by the cache handler.
///
/// Implementations must tolerate concurrent calls from many in-flight
/// requests; the handler holds no lock around them.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `NotFound` on a miss, `InvalidEntry` when something is stored but
    /// cannot be decoded.
    async fn get(&self, key: &CacheKey) -> Result<CachedEntry, StoreError>;

    async fn set(&self, key: &CacheKey, entry: CachedEntry) -> Result<(), StoreError>;

    async fn delete(&self, key: &CacheKey) -> Result<(), StoreError>;

    /// Drop every entry.
    async fn flush(&self) -> Result<(), StoreError>;

    /// Short label for diagnostics (e.g. `MEMORY`).
    fn origin(&self) -> &str;
}
