use std::fmt;

/// Why a response may not be stored (or served without revalidation).
///
/// Several reasons can hold at once; [`crate::Evaluation`] keeps all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// POST without explicit freshness information.
    RequestMethodPost,
    RequestMethodPut,
    RequestMethodDelete,
    RequestMethodConnect,
    RequestMethodOptions,
    RequestMethodTrace,
    RequestMethodPatch,
    RequestMethodUnknown,
    /// The request itself asked for `no-store`.
    RequestNoStore,
    /// `Authorization` on the request, shared cache, and nothing in the
    /// response that allows sharing it.
    RequestAuthorizationHeader,
    ResponseNoStore,
    ResponseNoCache,
    /// `private` response in a shared cache.
    ResponsePrivate,
    /// Status is not heuristically cacheable and there is no explicit freshness.
    ResponseUncachableByDefault,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::RequestMethodPost => "request-method-post",
            Reason::RequestMethodPut => "request-method-put",
            Reason::RequestMethodDelete => "request-method-delete",
            Reason::RequestMethodConnect => "request-method-connect",
            Reason::RequestMethodOptions => "request-method-options",
            Reason::RequestMethodTrace => "request-method-trace",
            Reason::RequestMethodPatch => "request-method-patch",
            Reason::RequestMethodUnknown => "request-method-unknown",
            Reason::RequestNoStore => "request-no-store",
            Reason::RequestAuthorizationHeader => "request-authorization-header",
            Reason::ResponseNoStore => "response-no-store",
            Reason::ResponseNoCache => "response-no-cache",
            Reason::ResponsePrivate => "response-private",
            Reason::ResponseUncachableByDefault => "response-uncachable-by-default",
        }
    }

    /// True for the reasons that forbid writing the response anywhere.
    pub fn is_no_store(&self) -> bool {
        matches!(self, Reason::RequestNoStore | Reason::ResponseNoStore)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
