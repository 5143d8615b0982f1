use serde::Deserialize;

// =======================================================
// STORE BACKEND (typed enum)
// =======================================================
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "disk")]
    Disk,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionKind {
    #[default]
    #[serde(rename = "lru")]
    Lru,
    #[serde(rename = "lfu")]
    Lfu,
}

// =======================================================
// STORE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Item-count ceiling for the memory backend.
    pub capacity: u64,
    /// Backend-side TTL in seconds; 0 disables it.
    pub ttl_secs: u64,
    pub eviction: EvictionKind,
    /// Directory for the disk backend.
    pub dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            capacity: 100,
            ttl_secs: 0,
            eviction: EvictionKind::Lru,
            dir: "./.hcache".into(),
        }
    }
}

impl StoreConfig {
    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn ttl_secs(&self) -> Option<u64> {
        (self.ttl_secs > 0).then_some(self.ttl_secs)
    }

    pub fn eviction(&self) -> EvictionKind {
        self.eviction
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &StoreConfig) {
        if self.capacity == 0 {
            self.capacity = defaults.capacity;
        }
        if self.dir.trim().is_empty() {
            self.dir = defaults.dir.clone();
        }
    }
}
