//! Searchtap - a transparent interception proxy for chat-completions traffic
//!
//! The proxy forwards all requests byte-for-byte to the configured backend
//! (including long-lived streamed responses) and, as a best-effort side
//! effect, extracts each user's latest query and records it against a
//! resolved user identity.

pub mod application;
pub mod capture;
pub mod config;
pub mod error;
pub mod proxy;
pub mod store;

pub use application::Application;
pub use error::{Error, Result};
