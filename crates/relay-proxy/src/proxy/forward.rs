//! Outbound dispatch and response relay.
//!
//! The response body is read to completion before relaying so that a
//! failure mid-body still surfaces as a well-formed 500, and the target
//! connection is closed before the caller sees anything.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use bytes::Bytes;
use tracing::Instrument;
use url::Url;

use super::headers;
use crate::config::ForwardConfig;
use crate::error::ForwardError;

/// A fully sanitized request, ready to go to the target.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Client builder for the outbound leg.
///
/// - one timeout covers connect, send and the full response body
/// - no idle pooling: a connection lives exactly as long as one forwarding
/// - redirects are relayed to the caller, not followed
pub fn client_builder(config: &ForwardConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
}

/// Send `request` to its target and turn the target's answer into the
/// relayed response: same status, same body bytes, framing headers removed.
pub async fn forward(
    client: &reqwest::Client,
    request: OutboundRequest,
    correlation_id: &str,
) -> Result<Response, ForwardError> {
    let target = format!(
        "{}{}",
        request.url.host_str().unwrap_or_default(),
        request.url.path()
    );
    let span = relay_tracing::target_forward_span!(correlation_id, target);
    let start = Instant::now();

    async {
        let mut req_builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body);
        }

        let upstream = req_builder.send().await.map_err(|e| {
            record_failure(&e, start);
            ForwardError::forwarding(&e)
        })?;

        let status = upstream.status();
        let relayed_headers = headers::relay_headers(upstream.headers());

        let body = upstream.bytes().await.map_err(|e| {
            record_failure(&e, start);
            ForwardError::forwarding(&e)
        })?;

        let latency = start.elapsed().as_millis() as u64;
        let span = tracing::Span::current();
        span.record("status", status.as_u16());
        span.record("latency_ms", latency);
        span.record("response_bytes", body.len() as u64);

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency,
            "Forward complete"
        );

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = relayed_headers;
        Ok(response)
    }
    .instrument(span)
    .await
}

fn record_failure(e: &reqwest::Error, start: Instant) {
    let latency = start.elapsed().as_millis() as u64;
    tracing::Span::current().record("latency_ms", latency);

    if e.is_timeout() {
        tracing::error!(error = %e, latency_ms = latency, "Target timeout");
    } else {
        tracing::error!(error = %e, latency_ms = latency, "Target connection error");
    }
}
