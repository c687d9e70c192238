//! Header sanitization for both legs of the relay.
//!
//! The relay is transparent: inbound headers go out untouched apart from
//! `Host`, and target headers come back untouched apart from the framing
//! headers that stop being true once the client has decoded the body.

use axum::http::header::HOST;
use axum::http::HeaderMap;

/// Target response headers never relayed to the caller (compared
/// case-insensitively).
pub const STRIPPED_RESPONSE_HEADERS: &[&str] = &["content-encoding", "transfer-encoding", "connection"];

pub fn is_stripped_response_header(name: &str) -> bool {
    STRIPPED_RESPONSE_HEADERS
        .iter()
        .any(|h| name.eq_ignore_ascii_case(h))
}

/// Headers for the outbound request: everything the caller sent except
/// `Host`, which the client derives from the rebuilt target authority.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.remove(HOST);
    headers
}

/// Headers for the relayed response. Multi-valued headers keep every value
/// in order.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if is_stripped_response_header(name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
