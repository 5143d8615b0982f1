//! Storage side of the HTTP cache.
//!
//! [`CacheStore`] is the contract the orchestrator talks to; [`MemoryStore`]
//! and [`DiskStore`] are the backends shipped with the workspace. Any other
//! backend only has to implement the trait.

mod disk;
mod entry;
mod error;
mod key;
mod memory;
mod store;

pub use disk::DiskStore;
pub use entry::CachedEntry;
pub use error::StoreError;
pub use key::CacheKey;
pub use memory::{Eviction, MemoryStore, MemoryStoreOptions, DEFAULT_CAPACITY};
pub use store::CacheStore;
