use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::AGE;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use tracing::{debug, instrument, warn};

use hcache_policy::{CacheKind, CachePolicy, Evaluation, MaxStale, RequestDirectives};
use hcache_store::{
    CacheKey, CacheStore, CachedEntry, MemoryStore, MemoryStoreOptions, StoreError,
};

use crate::{Transport, TransportError};

/// Present (value `1`) only on responses served from the store.
pub const X_FROM_CACHE: HeaderName = HeaderName::from_static("x-from-cache");

/// Origin label of the store that served the response.
pub const X_CACHE_ORIGIN: HeaderName = HeaderName::from_static("x-cache-origin");

/// Provenance attached to every response as an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store; the network was not touched.
    Hit,
    /// Fetched live; the response may have been stored.
    Miss,
    /// The cache was not consulted at all.
    Bypass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Enforce every directive the evaluator reports. When off, any 2xx
    /// (except 204) is stored unless marked `no-store`, and stored entries
    /// are served for as long as the backend keeps them.
    pub rfc_compliance: bool,
    /// Single-user cache: `private` responses and `Authorization`
    /// requests may be stored, `s-maxage` is ignored.
    pub private_cache: bool,
    /// In RFC mode, also store responses with no freshness information.
    /// They are kept for diagnostics but never served unconditionally.
    pub store_without_freshness: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            rfc_compliance: true,
            private_cache: true,
            store_without_freshness: false,
        }
    }
}

// =======================================================
// CACHE HANDLER
// =======================================================

/// HTTP cache in front of a [`Transport`].
///
/// The store is the only shared mutable state and no lock is held across a call, so concurrent misses on the
/// same key may both fetch and both write (last write wins).
pub struct CacheHandler<T> {
    transport: T,
    store: Arc<dyn CacheStore>,
    policy: CachePolicy,
    options: CacheOptions,
}

impl<T: Transport> CacheHandler<T> {
    pub fn new(transport: T, store: Arc<dyn CacheStore>, options: CacheOptions) -> Self {
        let policy = CachePolicy::new(CacheKind::from_private_flag(options.private_cache));
        Self {
            transport,
            store,
            policy,
            options,
        }
    }

    /// Handler over a default-sized in-memory store. `ttl` bounds how long
    /// the backend keeps entries regardless of HTTP freshness.
    pub fn with_memory_store(
        transport: T,
        rfc_compliance: bool,
        private_cache: bool,
        ttl: Option<Duration>,
    ) -> Self {
        let store = MemoryStore::with_options(MemoryStoreOptions {
            ttl,
            ..MemoryStoreOptions::default()
        });
        Self::new(
            transport,
            Arc::new(store),
            CacheOptions {
                rfc_compliance,
                private_cache,
                ..CacheOptions::default()
            },
        )
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn options(&self) -> CacheOptions {
        self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drop the stored response that `req` would be served from, if any.
    /// The key is derived exactly as in [`execute`](Self::execute).
    pub async fn invalidate<B>(&self, req: &Request<B>) -> Result<(), StoreError> {
        let key = CacheKey::from_request(req);
        debug!(target: "hcache::cache", cache_key = %key, "Invalidating entry");
        self.store.delete(&key).await
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        self.store.flush().await
    }

    /// Serve from the store when a fresh entry exists, otherwise fetch live
    /// and store the response if it qualifies.
    ///
    /// Only transport errors are returned; store failures are logged and
    /// treated as a miss (on read) or skipped (on write).
    #[instrument(skip(self, req), fields(method = %req.method(), uri = %req.uri()))]
    pub async fn execute(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        let req_dir = RequestDirectives::from_headers(req.headers());

        if !CachePolicy::is_cacheable(req.method()) || req_dir.no_store {
            debug!(target: "hcache::cache", "Bypassing cache");
            let mut res = self.transport.round_trip(req).await?;
            res.extensions_mut().insert(CacheStatus::Bypass);
            return Ok(res);
        }

        let key = CacheKey::from_request(&req);

        if req_dir.no_cache {
            debug!(target: "hcache::cache", cache_key = %key, "Request asked for no-cache, skipping lookup");
        } else if let Some(res) = self.lookup(&key, &req, &req_dir).await {
            return Ok(res);
        }

        // The transport consumes the request; keep what evaluation needs.
        let method = req.method().clone();
        let req_headers = req.headers().clone();

        let mut res = self.transport.round_trip(req).await?;
        self.maybe_store(&key, &method, &req_headers, &res, SystemTime::now())
            .await;

        res.extensions_mut().insert(CacheStatus::Miss);
        Ok(res)
    }

    async fn lookup(
        &self,
        key: &CacheKey,
        req: &Request<Bytes>,
        req_dir: &RequestDirectives,
    ) -> Option<Response<Bytes>> {
        let entry = match self.store.get(key).await {
            Ok(entry) => entry,
            Err(StoreError::NotFound) => {
                debug!(target: "hcache::cache", cache_key = %key, "Cache miss");
                return None;
            }
            Err(err) => {
                warn!(
                    target: "hcache::cache",
                    cache_key = %key,
                    origin = %self.store.origin(),
                    error = %err,
                    "Failed to retrieve from cache, trying with a live version"
                );
                return None;
            }
        };

        if self.options.rfc_compliance {
            // Freshness is recomputed from the stored headers, anchored at the
            // time the entry was written.
            let eval = self.policy.evaluate(
                req.method(),
                req.headers(),
                entry.status,
                &entry.headers,
                entry.stored_at,
            );
            if !eval.is_cacheable() {
                debug!(
                    target: "hcache::cache",
                    cache_key = %key,
                    reasons = ?eval.reasons(),
                    "Stored entry no longer qualifies"
                );
                return None;
            }
            if !servable(&eval, &entry, req_dir, SystemTime::now()) {
                debug!(target: "hcache::cache", cache_key = %key, "Stored entry is stale");
                return None;
            }
        }

        debug!(target: "hcache::cache", cache_key = %key, "Cache hit");
        Some(self.serve_cached(entry))
    }

    fn serve_cached(&self, entry: CachedEntry) -> Response<Bytes> {
        let age = entry.age();
        let mut res = entry.into_response();

        let headers = res.headers_mut();
        headers.insert(X_FROM_CACHE, HeaderValue::from_static("1"));
        if let Ok(origin) = HeaderValue::from_str(self.store.origin()) {
            headers.insert(X_CACHE_ORIGIN, origin);
        }
        headers.insert(AGE, HeaderValue::from(age.as_secs()));

        res.extensions_mut().insert(CacheStatus::Hit);
        res
    }

    async fn maybe_store(
        &self,
        key: &CacheKey,
        method: &Method,
        req_headers: &HeaderMap,
        res: &Response<Bytes>,
        now: SystemTime,
    ) {
        let eval = self
            .policy
            .evaluate(method, req_headers, res.status(), res.headers(), now);

        if !self.should_store(&eval, res.status(), now) {
            debug!(
                target: "hcache::cache",
                cache_key = %key,
                status = res.status().as_u16(),
                reasons = ?eval.reasons(),
                expires_at = ?eval.expires_at(),
                "Cache skip"
            );
            return;
        }

        let entry = CachedEntry::stored_at(
            res.status(),
            res.headers().clone(),
            res.body().clone(),
            now,
        );

        match self.store.set(key, entry).await {
            Ok(()) => debug!(
                target: "hcache::cache",
                cache_key = %key,
                bytes = res.body().len(),
                fresh_for = ?eval.freshness_lifetime(now),
                "Cached response"
            ),
            Err(err) => warn!(
                target: "hcache::cache",
                cache_key = %key,
                origin = %self.store.origin(),
                error = %err,
                "Can't store the response in the cache"
            ),
        }
    }

    fn should_store(&self, eval: &Evaluation, status: StatusCode, now: SystemTime) -> bool {
        if !self.options.rfc_compliance {
            return status.is_success() && status != StatusCode::NO_CONTENT && !eval.forbids_storage();
        }

        if !eval.is_cacheable() {
            return false;
        }

        match eval.expires_at() {
            Some(expires) if expires > now => true,
            _ => self.options.store_without_freshness,
        }
    }
}

/// Freshness check for a stored entry, adjusted by the request's own
/// `max-age`, `min-fresh` and `max-stale`.
fn servable(eval: &Evaluation, entry: &CachedEntry, req_dir: &RequestDirectives, now: SystemTime) -> bool {
    let Some(expires) = eval.expires_at() else {
        return false;
    };

    if let Some(max_age) = req_dir.max_age
        && entry.age() > max_age
    {
        return false;
    }

    let needed = req_dir
        .min_fresh
        .and_then(|min_fresh| now.checked_add(min_fresh))
        .unwrap_or(now);
    if eval.is_fresh_at(needed) {
        return true;
    }

    match req_dir.max_stale {
        Some(MaxStale::Any) => true,
        Some(MaxStale::Limit(limit)) => needed
            .duration_since(expires)
            .is_ok_and(|stale_for| stale_for <= limit),
        None => false,
    }
}

#[async_trait]
impl<T: Transport> Transport for CacheHandler<T> {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        self.execute(req).await
    }
}
