use std::time::{SystemTime, UNIX_EPOCH};

use http::{HeaderMap, HeaderName};
use tracing::debug;

/// A date header is either missing, unparseable, or a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateHeader {
    Absent,
    Malformed,
    At(SystemTime),
}

impl DateHeader {
    pub(crate) fn read(headers: &HeaderMap, name: &HeaderName) -> Self {
        let Some(value) = headers.get(name) else {
            return DateHeader::Absent;
        };

        let parsed = value
            .to_str()
            .ok()
            .and_then(|raw| httpdate::parse_http_date(raw.trim()).ok());

        match parsed {
            Some(at) => DateHeader::At(at),
            None => {
                debug!(
                    target: "hcache::policy",
                    header = %name,
                    value = ?value,
                    "Unparseable HTTP date"
                );
                DateHeader::Malformed
            }
        }
    }

    pub(crate) fn at(self) -> Option<SystemTime> {
        match self {
            DateHeader::At(at) => Some(at),
            _ => None,
        }
    }
}

/// `base + (to - from)`, where the difference may be negative.
pub(crate) fn shift_by_difference(base: SystemTime, from: SystemTime, to: SystemTime) -> SystemTime {
    match to.duration_since(from) {
        Ok(ahead) => base.checked_add(ahead).unwrap_or(base),
        Err(behind) => base.checked_sub(behind.duration()).unwrap_or(UNIX_EPOCH),
    }
}
