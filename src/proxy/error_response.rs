//! Unified error response handling for the proxy service
//!
//! Client-facing errors share one JSON shape so callers can handle them
//! programmatically regardless of which route produced them.

use crate::proxy::types::ProxyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Unique error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Convert to an HTTP response with the given status
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Extension trait for consistent error formatting
pub trait ErrorResponseExt {
    /// Convert to standardized error response
    fn to_error_response(&self) -> ErrorResponse;

    /// Get the appropriate HTTP status code
    fn status_code(&self) -> StatusCode;
}

/// Fixed message for upstream transport failures; every such failure maps
/// to the same 502 regardless of relay mode.
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "Upstream agent service is unavailable";

impl ErrorResponseExt for ProxyError {
    fn to_error_response(&self) -> ErrorResponse {
        use ProxyError::*;

        match self {
            UpstreamUnavailable(_) | UpstreamTimeout(_) => {
                ErrorResponse::new("UPSTREAM_UNAVAILABLE", UPSTREAM_UNAVAILABLE_MESSAGE)
            }
            InvalidUpstreamUri(uri) => {
                ErrorResponse::new("INVALID_UPSTREAM_URI", format!("Invalid upstream URI: {uri}"))
            }
            HttpError(e) => ErrorResponse::new("HTTP_ERROR", format!("HTTP error: {e}")),
            Internal(msg) => ErrorResponse::new("INTERNAL_ERROR", msg.clone()),
        }
    }

    fn status_code(&self) -> StatusCode {
        use ProxyError::*;

        match self {
            UpstreamUnavailable(_) | UpstreamTimeout(_) => StatusCode::BAD_GATEWAY,
            InvalidUpstreamUri(_) | HttpError(_) | Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if matches!(
            self,
            ProxyError::UpstreamUnavailable(_) | ProxyError::UpstreamTimeout(_)
        ) {
            tracing::error!(error = %self, "Error forwarding request to upstream");
        }
        self.to_error_response().into_response_with_status(status)
    }
}
