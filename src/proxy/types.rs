//! Type definitions for the proxy module

use nutype::nutype;
use std::time::Duration;
use thiserror::Error;

/// Base URL of the upstream chat-completions backend.
#[nutype(
    derive(Clone, Debug, Display, Deserialize, Serialize, TryFrom, AsRef),
    validate(predicate = |s: &str| s.starts_with("http://") || s.starts_with("https://")),
)]
pub struct UpstreamUrl(String);

/// How the upstream response body is relayed back to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardMode {
    /// Wait for the complete upstream response before returning any of it.
    Buffered,
    /// Relay raw upstream bytes as they arrive, preserving chunk order.
    Streaming,
}

/// Errors that can occur in the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Transport-level failure reaching the upstream: connection refused,
    /// DNS failure, or the forward timeout elapsing.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Invalid upstream URI: {0}")]
    InvalidUpstreamUri(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] http::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url_requires_http_scheme() {
        assert!(UpstreamUrl::try_new("http://localhost:8091".to_string()).is_ok());
        assert!(UpstreamUrl::try_new("https://agents.example.com".to_string()).is_ok());
        assert!(UpstreamUrl::try_new("localhost:8091".to_string()).is_err());
        assert!(UpstreamUrl::try_new("ftp://nope".to_string()).is_err());
    }

}
