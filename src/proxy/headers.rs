//! HTTP header hygiene for the proxy service
//!
//! Hop-by-hop headers are meaningful only for a single connection leg and
//! must not be relayed across proxy hops. `content-length` is stripped as
//! well because the relay may change body framing (chunked streaming).

use http::header::HOST;
use http::HeaderMap;

/// Header names stripped in both directions, matched case-insensitively.
pub const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Which leg of the relay a header set is being sanitized for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Client request headers about to be sent upstream. Also strips `host`
    /// so the client's authority never leaks to the upstream connection.
    Request,
    /// Upstream response headers about to be returned to the client.
    Response,
}

/// Return a copy of `headers` with hop-by-hop names removed. All other
/// headers keep their values and relative order.
pub fn sanitize_headers(headers: &HeaderMap, direction: Direction) -> HeaderMap {
    let mut sanitized = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let lowered = name.as_str().to_ascii_lowercase();
        if HOP_BY_HOP_HEADERS.contains(&lowered.as_str()) {
            continue;
        }
        if direction == Direction::Request && *name == HOST {
            continue;
        }
        sanitized.append(name.clone(), value.clone());
    }
    sanitized
}

/// Well-known paths
pub mod paths {
    /// Health check endpoint path
    pub const HEALTH: &str = "/health";

    /// Direct event-log endpoint path
    pub const LOG_SEARCH: &str = "/log-search";

    /// Chat-completions passthrough path
    pub const CHAT_COMPLETIONS: &str = "/v1/chat/completions";

    /// Catch-all for everything else under the proxied API prefix
    pub const API_PASSTHROUGH: &str = "/v1/{*rest}";
}
