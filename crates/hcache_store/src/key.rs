use std::fmt;
use std::hash::{Hash, Hasher};

use http::Request;
use http::header::HOST;

/// Identity of a cached response: method plus the full target URI.
///
/// Two requests share a key iff method, scheme, host, path and query are
/// byte-identical.
#[derive(Hash, Eq, PartialEq, Debug, Clone)]
pub struct CacheKey {
    method: String,
    uri: String,
}

impl CacheKey {
    pub fn new(method: &str, uri: &str) -> Self {
        Self {
            method: method.to_string(),
            uri: uri.to_string(),
        }
    }

    /// Derive the key from a request. Origin-form targets (`/path?q`) are
    /// completed from the `Host` header so they still carry the authority.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let uri = req.uri();
        if uri.authority().is_some() {
            return Self::new(req.method().as_str(), &uri.to_string());
        }

        let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let full = match req.headers().get(HOST).and_then(|h| h.to_str().ok()) {
            Some(host) => format!("http://{host}{target}"),
            None => target.to_string(),
        };
        Self::new(req.method().as_str(), &full)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Stable 64-bit hash, used to name on-disk files.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::CacheKey;
    use http::Request;

    #[test]
    fn key_includes_method_and_full_uri() {
        let req = Request::get("https://example.com/a?b=1").body(()).expect("request");
        let key = CacheKey::from_request(&req);
        assert_eq!(key.to_string(), "GET https://example.com/a?b=1");
    }

    #[test]
    fn query_and_method_change_the_key() {
        let a = Request::get("http://example.com/a?b=1").body(()).expect("request");
        let b = Request::get("http://example.com/a?b=2").body(()).expect("request");
        let c = Request::head("http://example.com/a?b=1").body(()).expect("request");
        let ka = CacheKey::from_request(&a);
        assert_ne!(ka, CacheKey::from_request(&b));
        assert_ne!(ka, CacheKey::from_request(&c));
        assert_eq!(ka, CacheKey::from_request(&a));
    }

    #[test]
    fn origin_form_uses_host_header() {
        let req = Request::get("/hello")
            .header("host", "localhost:8080")
            .body(())
            .expect("request");
        assert_eq!(
            CacheKey::from_request(&req).uri(),
            "http://localhost:8080/hello"
        );
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = CacheKey::new("GET", "http://example.com/");
        let b = CacheKey::new("GET", "http://example.com/");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
