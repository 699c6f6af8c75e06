//! HTTP surface of the proxy: route bindings and capture dispatch.
//!
//! The chat-completions route is the interesting one: it extracts a search
//! event from the parsed body, dispatches persistence as a fire-and-forget
//! task, and forwards the raw request bytes in parallel. Capture failures
//! are logged and swallowed; they never delay or alter the proxied
//! response.

use crate::capture::{extract_search_event, stream_requested, SearchEvent};
use crate::proxy::error_response::ErrorResponse;
use crate::proxy::forwarder::Forwarder;
use crate::proxy::headers::paths;
use crate::proxy::types::ForwardMode;
use crate::store::EventSink;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared per-process handles: the upstream client and the event sink.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub sink: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new(forwarder: Arc<Forwarder>, sink: Arc<dyn EventSink>) -> Self {
        Self { forwarder, sink }
    }
}

/// Build the proxy router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(paths::HEALTH, get(health))
        .route(paths::LOG_SEARCH, post(log_search))
        .route(paths::CHAT_COMPLETIONS, post(chat_completions))
        .route(paths::API_PASSTHROUGH, any(api_passthrough))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Direct event-log endpoint. The one place a store failure is
/// client-visible.
async fn log_search(
    State(state): State<AppState>,
    Json(event): Json<SearchEvent>,
) -> Response {
    match state.sink.record_event(event).await {
        Ok(stored) => Json(json!({
            "ok": true,
            "search_id": stored.search_id.to_string(),
            "user_id": stored.user_id.to_string(),
        }))
        .into_response(),
        Err(e) => ErrorResponse::new("STORE_ERROR", format!("Failed to store search event: {e}"))
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Chat-completions passthrough with side-effect capture.
async fn chat_completions(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ErrorResponse::new("INVALID_BODY", format!("Failed to read request body: {e}"))
                .into_response_with_status(StatusCode::BAD_REQUEST)
        }
    };

    // Structured parsing is mandatory on this route.
    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(_) => {
            return ErrorResponse::new("INVALID_JSON", "Request body must be valid JSON")
                .into_response_with_status(StatusCode::BAD_REQUEST)
        }
    };

    if let Some(event) = extract_search_event(&payload) {
        let sink = Arc::clone(&state.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.record_event(event).await {
                tracing::warn!(error = %e, "Unable to persist search event");
            }
        });
    }

    let accepts_event_stream = parts
        .headers
        .get(header::ACCEPT)
        .and_then(|accept| accept.to_str().ok())
        .is_some_and(|accept| accept.starts_with("text/event-stream"));
    let mode = if stream_requested(&payload) || accepts_event_stream {
        ForwardMode::Streaming
    } else {
        ForwardMode::Buffered
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(paths::CHAT_COMPLETIONS);

    match state
        .forwarder
        .forward(parts.method, path_and_query, &parts.headers, bytes, mode)
        .await
    {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Generic passthrough for every other path under the proxied API prefix:
/// raw bytes in both directions, no parsing, no capture.
async fn api_passthrough(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ErrorResponse::new("INVALID_BODY", format!("Failed to read request body: {e}"))
                .into_response_with_status(StatusCode::BAD_REQUEST)
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match state
        .forwarder
        .forward(
            parts.method,
            path_and_query,
            &parts.headers,
            bytes,
            ForwardMode::Buffered,
        )
        .await
    {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}
