//! Transparent forwarding proxy in front of the chat-completions backend.
//!
//! The proxy relays traffic byte-for-byte (buffered or streaming) while the
//! capture path records search events as a non-blocking side effect.

pub mod error_response;
pub mod forwarder;
pub mod headers;
pub mod service;
pub mod types;


pub use error_response::{ErrorResponse, ErrorResponseExt};
pub use forwarder::Forwarder;
pub use service::{router, AppState};
pub use types::{ForwardMode, ProxyError, ProxyResult, UpstreamUrl};
