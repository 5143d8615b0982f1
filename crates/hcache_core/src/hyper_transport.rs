use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, instrument};

use crate::{Transport, TransportError};

/// Network transport on top of the pooled hyper client. Speaks plain HTTP
/// and HTTPS (rustls with the bundled webpki roots).
///
/// Bodies are buffered completely; nothing is returned (or cached) until the
/// whole response has arrived.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    request_timeout: Option<Duration>,
}

impl HyperTransport {
    pub fn new() -> Self {
        Self::with_timeouts(None, None)
    }

    pub fn with_timeouts(connect_timeout: Option<Duration>, request_timeout: Option<Duration>) -> Self {
        let mut http = HttpConnector::new();
        http.set_connect_timeout(connect_timeout);
        // The TLS layer decides the scheme.
        http.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            request_timeout,
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    #[instrument(skip(self, req), fields(method = %req.method(), uri = %req.uri()))]
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        if req.uri().authority().is_none() {
            return Err(TransportError::InvalidRequest(format!(
                "request target '{}' has no host",
                req.uri()
            )));
        }

        let (parts, body) = req.into_parts();
        let req = Request::from_parts(parts, Full::new(body));

        let exchange = async {
            let res = self
                .client
                .request(req)
                .await
                .map_err(TransportError::Connect)?;
            let (parts, body) = res.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(TransportError::Body)?
                .to_bytes();
            debug!(
                target: "hcache::transport",
                status = parts.status.as_u16(),
                bytes = bytes.len(),
                "Live response received"
            );
            Ok::<_, TransportError>(Response::from_parts(parts, bytes))
        };

        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => exchange.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HyperTransport;
    use crate::{Transport, TransportError};
    use bytes::Bytes;
    use http::Request;
    use std::error::Error;
    use std::time::Duration;

    fn error_chain(err: &dyn Error) -> String {
        let mut out = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }

    #[tokio::test]
    async fn https_targets_reach_the_connector() {
        let transport = HyperTransport::with_timeouts(Some(Duration::from_secs(2)), None);
        let req = Request::get("https://127.0.0.1:1/")
            .body(Bytes::new())
            .expect("request");

        let err = transport.round_trip(req).await.expect_err("nothing listens on port 1");
        assert!(matches!(err, TransportError::Connect(_)), "got {err}");
        let chain = error_chain(&err);
        assert!(!chain.contains("scheme is not http"), "{chain}");
    }
}
