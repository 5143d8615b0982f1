use std::time::{Duration, SystemTime};

use crate::Reason;

/// Outcome of evaluating one request/response pair.
///
/// `expires_at == None` means no explicit or heuristic freshness could be
/// computed (or `Expires` was malformed): the response is not servable
/// without revalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    reasons: Vec<Reason>,
    expires_at: Option<SystemTime>,
}

impl Evaluation {
    /// Disqualifying reasons in the order they were found. Empty means cacheable.
    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    pub fn is_cacheable(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn has_reason(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }

    /// Any `no-store`, from either side of the exchange.
    pub fn forbids_storage(&self) -> bool {
        self.reasons.iter().any(Reason::is_no_store)
    }

    /// Fresh means an expiry exists and `now` is strictly before it.
    pub fn is_fresh_at(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|expires| now < expires)
    }

    /// Lifetime measured from `from`; zero once expired.
    pub fn freshness_lifetime(&self, from: SystemTime) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.duration_since(from).unwrap_or(Duration::ZERO))
    }

    pub(crate) fn push(&mut self, reason: Reason) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }

    pub(crate) fn set_expires_at(&mut self, expires_at: Option<SystemTime>) {
        self.expires_at = expires_at;
    }
}
