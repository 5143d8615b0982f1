//! Configuration model for the hcache client.
//!
//! Loaded from an optional TOML file, then overridden by `HCACHE_*`
//! environment variables (`HCACHE_STORE__BACKEND=disk`).

mod cache;
mod client;
mod global;
mod hcache;
mod store;
pub mod validation;

pub use cache::CacheConfig;
pub use client::ClientConfig;
pub use global::GlobalConfig;
pub use hcache::HcacheConfig;
pub use store::{EvictionKind, StoreBackend, StoreConfig};
pub use validation::{ConfigReport, Issue, Severity};
