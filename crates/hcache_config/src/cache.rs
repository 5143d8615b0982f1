use serde::Deserialize;

// =======================================================
// CACHE BEHAVIOUR CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enforce Cache-Control semantics. Off means "store any 2xx".
    pub rfc_compliance: bool,
    /// Single-user cache (browser-like) instead of a shared one.
    pub private_cache: bool,
    /// Store responses that carry no freshness information.
    pub store_without_freshness: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            rfc_compliance: true,
            private_cache: true,
            store_without_freshness: false,
        }
    }
}

impl CacheConfig {
    pub fn rfc_compliance(&self) -> bool {
        self.rfc_compliance
    }

    pub fn private_cache(&self) -> bool {
        self.private_cache
    }

    pub fn store_without_freshness(&self) -> bool {
        self.store_without_freshness
    }
}
