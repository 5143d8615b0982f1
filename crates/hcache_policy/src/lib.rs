//! Freshness evaluation for cached HTTP responses.
//!
//! Given the request that produced a response and the response head, decide
//! which reasons (if any) forbid caching it and when it stops being fresh.
//! Everything here is a pure function of its inputs: no I/O, no clock reads
//! except where the caller asks for "now".

mod dates;
pub mod directives;
mod evaluation;
mod policy;
mod reason;

pub use directives::{MaxStale, RequestDirectives, ResponseDirectives};
pub use evaluation::Evaluation;
pub use policy::{CacheKind, CachePolicy};
pub use reason::Reason;
