//! Span builder helpers for relay-proxy instrumentation.

/// Create a tracing span for one inbound request to the relay.
///
/// Usage: `let span = relay_request_span!(correlation_id, method);`
///
/// `target_host` is recorded once the `url` parameter has been resolved.
#[macro_export]
macro_rules! relay_request_span {
    ($correlation_id:expr, $method:expr) => {
        tracing::info_span!(
            "relay_request",
            correlation_id = %$correlation_id,
            method = %$method,
            target_host = tracing::field::Empty,
        )
    };
}

/// Create a tracing span for the outbound call to the resolved target.
#[macro_export]
macro_rules! target_forward_span {
    ($correlation_id:expr, $target:expr) => {
        tracing::info_span!(
            "target_forward",
            correlation_id = %$correlation_id,
            target = %$target,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
            response_bytes = tracing::field::Empty,
        )
    };
}
