//! Cross-origin layer for the HTTP listener.
//!
//! The allow-list is resolved once at startup and only ever seen here; the
//! forwarding pipeline has no access to it.

use std::convert::Infallible;

use axum::extract::{Request, State};
use axum::http::header::{ACCESS_CONTROL_REQUEST_METHOD, ORIGIN};
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use tower::{Layer, ServiceExt};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::AllowedOrigins;

/// Build the CORS layer from a startup-resolved allow-list.
///
/// Credentials are allowed, so a literal `*` origin is not an option;
/// "any origin" echoes the request's `Origin` instead. Methods and headers
/// are mirrored from the preflight request.
pub fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::mirror_request(),
        AllowedOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(origin = %origin, error = %e, "Ignoring unusable CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// A CORS preflight: `OPTIONS` carrying both `Origin` and
/// `Access-Control-Request-Method`.
pub fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request.headers().contains_key(ORIGIN)
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// Middleware applying `cors` to everything except plain `OPTIONS`.
///
/// `CorsLayer` answers every `OPTIONS` itself, which would swallow `OPTIONS`
/// calls meant for the target. Those skip the layer and reach the relay.
pub async fn cors_middleware(State(cors): State<CorsLayer>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS && !is_preflight(&request) {
        return next.run(request).await;
    }

    let result: Result<Response, Infallible> = cors.layer(next).oneshot(request).await;
    match result {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(method: Method, headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_preflight_detection() {
        assert!(is_preflight(&request(
            Method::OPTIONS,
            &[("origin", "https://a.example"), ("access-control-request-method", "PUT")],
        )));
        assert!(!is_preflight(&request(Method::OPTIONS, &[])));
        assert!(!is_preflight(&request(
            Method::OPTIONS,
            &[("origin", "https://a.example")],
        )));
        assert!(!is_preflight(&request(
            Method::GET,
            &[("origin", "https://a.example"), ("access-control-request-method", "PUT")],
        )));
    }
}
