use std::time::{Duration, SystemTime};

use http::header::{AUTHORIZATION, DATE, EXPIRES, LAST_MODIFIED};
use http::{HeaderMap, Method, StatusCode};
use tracing::debug;

use crate::dates::{shift_by_difference, DateHeader};
use crate::{Evaluation, Reason, RequestDirectives, ResponseDirectives};

/// Whether the cache serves a single user agent or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheKind {
    #[default]
    Private,
    Shared,
}

impl CacheKind {
    pub fn from_private_flag(is_private: bool) -> Self {
        if is_private {
            CacheKind::Private
        } else {
            CacheKind::Shared
        }
    }

    pub fn is_shared(self) -> bool {
        matches!(self, CacheKind::Shared)
    }
}

/// Freshness evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    kind: CacheKind,
}

/// One request/response pair with parsed directives.
struct Exchange<'a> {
    method: &'a Method,
    req_headers: &'a HeaderMap,
    req_dir: RequestDirectives,
    status: StatusCode,
    resp_headers: &'a HeaderMap,
    resp_dir: ResponseDirectives,
}

impl CachePolicy {
    pub fn new(kind: CacheKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Methods whose responses the cache will look up and serve.
    pub fn is_cacheable(method: &Method) -> bool {
        matches!(*method, Method::GET | Method::HEAD)
    }

    /// Evaluate a response received (or stored) at `now`.
    ///
    /// Never fails: unparseable headers degrade to "no freshness information".
    pub fn evaluate(
        &self,
        method: &Method,
        req_headers: &HeaderMap,
        status: StatusCode,
        resp_headers: &HeaderMap,
        now: SystemTime,
    ) -> Evaluation {
        let exchange = Exchange {
            method,
            req_headers,
            req_dir: RequestDirectives::from_headers(req_headers),
            status,
            resp_headers,
            resp_dir: ResponseDirectives::from_headers(resp_headers),
        };

        let mut eval = Evaluation::default();
        self.collect_reasons(&exchange, &mut eval);
        eval.set_expires_at(self.expiration(&exchange, now));

        debug!(
            target: "hcache::policy",
            method = %method,
            status = status.as_u16(),
            reasons = ?eval.reasons(),
            expires_at = ?eval.expires_at(),
            "Evaluated response"
        );

        eval
    }

    fn collect_reasons(&self, ex: &Exchange<'_>, eval: &mut Evaluation) {
        let shared = self.kind.is_shared();

        match *ex.method {
            Method::GET | Method::HEAD => {}
            // POST is only cacheable with explicit freshness (RFC 9110 §9.3.3).
            Method::POST => {
                if !self.has_explicit_freshness(ex) {
                    eval.push(Reason::RequestMethodPost);
                }
            }
            Method::PUT => eval.push(Reason::RequestMethodPut),
            Method::DELETE => eval.push(Reason::RequestMethodDelete),
            Method::CONNECT => eval.push(Reason::RequestMethodConnect),
            Method::OPTIONS => eval.push(Reason::RequestMethodOptions),
            Method::TRACE => eval.push(Reason::RequestMethodTrace),
            Method::PATCH => eval.push(Reason::RequestMethodPatch),
            _ => eval.push(Reason::RequestMethodUnknown),
        }

        if ex.req_dir.no_store {
            eval.push(Reason::RequestNoStore);
        }

        if shared
            && ex.req_headers.contains_key(AUTHORIZATION)
            && !(ex.resp_dir.public || ex.resp_dir.must_revalidate || ex.resp_dir.s_maxage.is_some())
        {
            eval.push(Reason::RequestAuthorizationHeader);
        }

        if ex.resp_dir.private && shared {
            eval.push(Reason::ResponsePrivate);
        }

        if ex.resp_dir.no_store {
            eval.push(Reason::ResponseNoStore);
        }

        if ex.resp_dir.no_cache {
            eval.push(Reason::ResponseNoCache);
        }

        if !(self.has_explicit_freshness(ex) || heuristically_cacheable(ex.status)) {
            eval.push(Reason::ResponseUncachableByDefault);
        }
    }

    fn has_explicit_freshness(&self, ex: &Exchange<'_>) -> bool {
        ex.resp_headers.contains_key(EXPIRES)
            || ex.resp_dir.max_age.is_some()
            || (self.kind.is_shared() && ex.resp_dir.s_maxage.is_some())
    }

    /// Absolute expiry, in priority order: s-maxage (shared only), max-age,
    /// Expires relative to Date, Last-Modified heuristic.
    fn expiration(&self, ex: &Exchange<'_>, now: SystemTime) -> Option<SystemTime> {
        if self.kind.is_shared()
            && let Some(s_maxage) = ex.resp_dir.s_maxage
        {
            return now.checked_add(s_maxage);
        }

        if let Some(max_age) = ex.resp_dir.max_age {
            return now.checked_add(max_age);
        }

        match DateHeader::read(ex.resp_headers, &EXPIRES) {
            DateHeader::At(expires) => {
                // Origin clock may disagree with ours; only the distance between
                // its Date and Expires is trusted.
                let server_date = DateHeader::read(ex.resp_headers, &DATE)
                    .at()
                    .unwrap_or(now);
                return Some(shift_by_difference(now, server_date, expires));
            }
            // Malformed Expires means "already expired" (RFC 9111 §5.3).
            DateHeader::Malformed => return None,
            DateHeader::Absent => {}
        }

        let last_modified = DateHeader::read(ex.resp_headers, &LAST_MODIFIED).at()?;
        let since = now.duration_since(last_modified).unwrap_or(Duration::ZERO);
        now.checked_add(since / 10)
    }
}

/// Statuses that may be cached with heuristic freshness (RFC 9110 §15.1).
fn heuristically_cacheable(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        200 | 203 | 204 | 206 | 300 | 301 | 308 | 404 | 405 | 410 | 414 | 501
    )
}
