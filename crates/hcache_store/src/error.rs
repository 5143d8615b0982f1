use thiserror::Error;

/// Failures reported by a storage backend.
///
/// `NotFound` and `InvalidEntry` must stay distinguishable: one is a plain
/// miss, the other a stored value that could not be decoded.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache entry not found")]
    NotFound,

    #[error("cached entry is invalid: {0}")]
    InvalidEntry(String),

    #[error("cache backend failure: {0}")]
    Backend(String),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}
