//! Transparent relay of requests to the upstream chat-completions backend.
//!
//! One process-scoped hyper client serves every forward. Buffered mode
//! returns the upstream response as a single unit; streaming mode relays
//! raw body bytes through a bounded channel as they arrive, so a slow
//! client applies back-pressure to the upstream read and dropping the
//! client side tears the upstream connection down.

use crate::proxy::headers::{sanitize_headers, Direction};
use crate::proxy::types::{ForwardMode, ProxyError, ProxyResult, UpstreamUrl};
use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, Method, Response, Uri};
use http_body_util::BodyExt;
use hyper::Request;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Buffered chunks between the upstream read loop and the client write
/// loop. Small on purpose: the upstream read should stall, not buffer,
/// when the client is slower.
const RELAY_CHANNEL_CAPACITY: usize = 16;

/// Forwarding proxy holding the shared upstream client.
#[derive(Clone)]
pub struct Forwarder {
    client: hyper_util::client::legacy::Client<
        hyper_util::client::legacy::connect::HttpConnector,
        Body,
    >,
    upstream: UpstreamUrl,
    /// Bounds connect time, the whole of a buffered forward, and the
    /// idle-read gap between streamed chunks.
    timeout: Duration,
}

impl Forwarder {
    pub fn new(upstream: UpstreamUrl, timeout: Duration) -> Self {
        let mut connector = hyper_util::client::legacy::connect::HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));

        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(connector);

        Self {
            client,
            upstream,
            timeout,
        }
    }

    /// Relay a request to the upstream and return its response with
    /// hop-by-hop headers stripped. Method, query, and body bytes pass
    /// through unchanged; `mode` decides buffered vs. streaming relay.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
        mode: ForwardMode,
    ) -> ProxyResult<Response<Body>> {
        let uri = self.target_uri(path_and_query)?;

        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))?;
        *request.headers_mut() = sanitize_headers(headers, Direction::Request);

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ProxyError::UpstreamTimeout(self.timeout))?
            .map_err(|e| ProxyError::UpstreamUnavailable(e.to_string()))?;

        match mode {
            ForwardMode::Buffered => self.relay_buffered(response).await,
            ForwardMode::Streaming => Ok(self.relay_streaming(response)),
        }
    }

    fn target_uri(&self, path_and_query: &str) -> ProxyResult<Uri> {
        let full = format!(
            "{}{}",
            self.upstream.as_ref().trim_end_matches('/'),
            path_and_query
        );
        full.parse()
            .map_err(|_| ProxyError::InvalidUpstreamUri(full))
    }

    /// Wait for the complete upstream body before returning anything. A
    /// failure mid-body is an upstream failure, never a partial response.
    async fn relay_buffered(
        &self,
        response: Response<hyper::body::Incoming>,
    ) -> ProxyResult<Response<Body>> {
        let (mut parts, body) = response.into_parts();

        let collected = tokio::time::timeout(self.timeout, body.collect())
            .await
            .map_err(|_| ProxyError::UpstreamTimeout(self.timeout))?
            .map_err(|e| ProxyError::UpstreamUnavailable(e.to_string()))?;

        parts.headers = sanitize_headers(&parts.headers, Direction::Response);
        Ok(Response::from_parts(parts, Body::from(collected.to_bytes())))
    }

    /// Relay raw body frames as they arrive, in arrival order, with no
    /// re-framing of event boundaries. A live stream may run indefinitely;
    /// only a gap with no bytes for the configured duration ends it.
    fn relay_streaming(&self, response: Response<hyper::body::Incoming>) -> Response<Body> {
        let (mut parts, mut upstream_body) = response.into_parts();
        parts.headers = sanitize_headers(&parts.headers, Direction::Response);

        let idle_timeout = self.timeout;
        let (tx, mut rx) = mpsc::channel::<Result<Bytes, io::Error>>(RELAY_CHANNEL_CAPACITY);

        // Reader task owns the upstream connection: when it returns (end of
        // stream, error, idle timeout, or the client side hanging up) the
        // body is dropped and the connection released.
        tokio::spawn(async move {
            loop {
                let frame = match tokio::time::timeout(idle_timeout, upstream_body.frame()).await {
                    Err(_) => {
                        tracing::warn!("Idle read timeout on streamed upstream response");
                        let _ = tx
                            .send(Err(io::Error::new(
                                io::ErrorKind::TimedOut,
                                "idle read timeout",
                            )))
                            .await;
                        break;
                    }
                    Ok(None) => break,
                    Ok(Some(Err(e))) => {
                        tracing::warn!(error = %e, "Upstream stream failed mid-relay");
                        let _ = tx.send(Err(io::Error::other(e))).await;
                        break;
                    }
                    Ok(Some(Ok(frame))) => frame,
                };

                if let Ok(data) = frame.into_data() {
                    if tx.send(Ok(data)).await.is_err() {
                        // Client disconnected; stop reading so the upstream
                        // connection closes promptly.
                        break;
                    }
                }
            }
        });

        let stream = futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx));
        Response::from_parts(parts, Body::from_stream(stream))
    }
}
