use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use thiserror::Error;

/// Errors surfaced to callers. Only network-side failures and malformed
/// requests end up here; cache faults never do.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request failed: {0}")]
    Connect(#[source] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] hyper::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Something that turns a request into a fully buffered response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        (**self).round_trip(req).await
    }
}
