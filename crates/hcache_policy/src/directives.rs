//! `Cache-Control` directive parsing.
//!
//! Parsing is lenient: unknown directives are kept as extensions and
//! malformed values make the directive absent. Nothing here fails.

use std::time::Duration;

use http::HeaderMap;
use http::header::{CACHE_CONTROL, PRAGMA};
use tracing::debug;

/// delta-seconds larger than this are clamped (RFC 9111 §1.2.2).
const MAX_DELTA_SECONDS: u64 = 2_147_483_648;

/// Directives carried by a response `Cache-Control` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDirectives {
    pub must_revalidate: bool,
    pub no_cache: bool,
    pub no_store: bool,
    pub no_transform: bool,
    pub public: bool,
    pub private: bool,
    pub proxy_revalidate: bool,
    pub immutable: bool,
    pub max_age: Option<Duration>,
    pub s_maxage: Option<Duration>,
    pub stale_if_error: Option<Duration>,
    pub stale_while_revalidate: Option<Duration>,
    /// Directives we do not interpret, lowercased, value included.
    pub extensions: Vec<String>,
}

/// `max-stale` may come with or without a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxStale {
    Any,
    Limit(Duration),
}

/// Directives carried by a request `Cache-Control` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDirectives {
    pub max_age: Option<Duration>,
    pub max_stale: Option<MaxStale>,
    pub min_fresh: Option<Duration>,
    pub no_cache: bool,
    pub no_store: bool,
    pub no_transform: bool,
    pub only_if_cached: bool,
    pub extensions: Vec<String>,
}

impl ResponseDirectives {
    /// Combine every `Cache-Control` line of `headers` and parse it.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::parse(&joined_cache_control(headers))
    }

    pub fn parse(value: &str) -> Self {
        let mut out = Self::default();

        for (name, arg) in split_directives(value) {
            match name.as_str() {
                "must-revalidate" => out.must_revalidate = true,
                // Field-name lists on no-cache / private narrow the directive to
                // those headers; we treat them as applying to the whole response.
                "no-cache" => out.no_cache = true,
                "no-store" => out.no_store = true,
                "no-transform" => out.no_transform = true,
                "public" => out.public = true,
                "private" => out.private = true,
                "proxy-revalidate" => out.proxy_revalidate = true,
                "immutable" => out.immutable = true,
                "max-age" => out.max_age = delta_seconds(&name, arg.as_deref()),
                "s-maxage" => out.s_maxage = delta_seconds(&name, arg.as_deref()),
                "stale-if-error" => out.stale_if_error = delta_seconds(&name, arg.as_deref()),
                "stale-while-revalidate" => {
                    out.stale_while_revalidate = delta_seconds(&name, arg.as_deref())
                }
                _ => out.extensions.push(render_extension(&name, arg.as_deref())),
            }
        }

        out
    }
}

impl RequestDirectives {
    /// Parse request directives. A bare `Pragma: no-cache` counts as
    /// `no-cache` when the request has no `Cache-Control` at all.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if headers.contains_key(CACHE_CONTROL) {
            return Self::parse(&joined_cache_control(headers));
        }

        let pragma_no_cache = headers
            .get_all(PRAGMA)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case("no-cache")));

        Self {
            no_cache: pragma_no_cache,
            ..Self::default()
        }
    }

    pub fn parse(value: &str) -> Self {
        let mut out = Self::default();

        for (name, arg) in split_directives(value) {
            match name.as_str() {
                "max-age" => out.max_age = delta_seconds(&name, arg.as_deref()),
                "max-stale" => {
                    out.max_stale = match arg.as_deref() {
                        None => Some(MaxStale::Any),
                        Some(raw) => delta_seconds(&name, Some(raw)).map(MaxStale::Limit),
                    }
                }
                "min-fresh" => out.min_fresh = delta_seconds(&name, arg.as_deref()),
                "no-cache" => out.no_cache = true,
                "no-store" => out.no_store = true,
                "no-transform" => out.no_transform = true,
                "only-if-cached" => out.only_if_cached = true,
                _ => out.extensions.push(render_extension(&name, arg.as_deref())),
            }
        }

        out
    }
}

fn joined_cache_control(headers: &HeaderMap) -> String {
    let mut combined = String::new();
    for value in headers.get_all(CACHE_CONTROL) {
        let Ok(value) = value.to_str() else {
            debug!(target: "hcache::policy", "Skipping non-ASCII Cache-Control value");
            continue;
        };
        if !combined.is_empty() {
            combined.push(',');
        }
        combined.push_str(value);
    }
    combined
}

/// Split a directive list into lowercased names and optional (unquoted)
/// arguments. Commas inside quoted strings do not split.
fn split_directives(value: &str) -> Vec<(String, Option<String>)> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in value.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                push_directive(&mut items, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_directive(&mut items, &current);

    items
}

fn push_directive(items: &mut Vec<(String, Option<String>)>, raw: &str) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }

    let (name, arg) = match raw.split_once('=') {
        Some((name, arg)) => (name.trim(), Some(unquote(arg.trim()))),
        None => (raw, None),
    };
    if name.is_empty() {
        return;
    }

    items.push((name.to_ascii_lowercase(), arg));
}

fn unquote(arg: &str) -> String {
    let inner = arg
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(arg);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn delta_seconds(name: &str, arg: Option<&str>) -> Option<Duration> {
    let Some(raw) = arg.map(str::trim) else {
        debug!(target: "hcache::policy", directive = %name, "Directive is missing its delta-seconds");
        return None;
    };

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        debug!(
            target: "hcache::policy",
            directive = %name,
            value = %raw,
            "Ignoring malformed delta-seconds"
        );
        return None;
    }

    // Only digits left, so the parse can only fail on overflow.
    let secs = raw
        .parse::<u64>()
        .unwrap_or(MAX_DELTA_SECONDS)
        .min(MAX_DELTA_SECONDS);
    Some(Duration::from_secs(secs))
}

fn render_extension(name: &str, arg: Option<&str>) -> String {
    match arg {
        Some(arg) => format!("{name}={arg}"),
        None => name.to_string(),
    }
}
