use std::time::{Duration, SystemTime};

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};

/// A stored response. Never mutated once written; a newer entry under the
/// same key replaces it whole.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub stored_at: SystemTime,
}

impl CachedEntry {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self::stored_at(status, headers, body, SystemTime::now())
    }

    pub fn stored_at(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        stored_at: SystemTime,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at,
        }
    }

    /// Snapshot a response (status, headers and body).
    pub fn from_response(res: &Response<Bytes>) -> Self {
        Self::new(res.status(), res.headers().clone(), res.body().clone())
    }

    /// Time since the entry was written; zero if the clock went backwards.
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.stored_at)
            .unwrap_or(Duration::ZERO)
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut res = Response::new(self.body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::CachedEntry;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};

    #[test]
    fn into_response_keeps_status_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let entry = CachedEntry::new(StatusCode::ACCEPTED, headers, Bytes::from_static(b"hi"));

        let res = entry.into_response();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.headers()["content-type"], "text/plain");
        assert_eq!(res.body().as_ref(), b"hi");
    }
}
