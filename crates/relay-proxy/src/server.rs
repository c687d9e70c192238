//! Axum HTTP server: router, listener, graceful shutdown.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, on, MethodFilter};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::{ForwardConfig, ProxyConfig};
use crate::cors;
use crate::error::ForwardError;
use crate::proxy::correlation;
use crate::proxy::forward::{self, OutboundRequest};
use crate::proxy::{headers, target};

/// Shared application state. Read-only; nothing here changes per request.
#[derive(Clone)]
pub struct AppState {
    pub forward: ForwardConfig,
    pub client: reqwest::Client,
}

/// Methods the relay accepts on `/`.
const RELAYED_METHODS: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PUT)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::DELETE)
    .or(MethodFilter::OPTIONS)
    .or(MethodFilter::HEAD);

/// Build the router. The CORS policy is handed in separately from the state
/// so the pipeline handlers never see it.
pub fn router(state: AppState, cors_policy: CorsLayer) -> Router {
    Router::new()
        .route("/", on(RELAYED_METHODS, handle_forward))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .method_not_allowed_fallback(handle_method_not_allowed)
        .with_state(Arc::new(state))
        .layer(axum::middleware::from_fn_with_state(
            cors_policy,
            cors::cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Build and run the HTTP server.
pub async fn run(config: ProxyConfig) -> anyhow::Result<()> {
    let listen_addr = config.server.listen_address.clone();

    let client = forward::client_builder(&config.forward).build()?;
    let cors_policy = cors::cors_layer(&config.cors.origins());
    let state = AppState {
        forward: config.forward,
        client,
    };

    let app = router(state, cors_policy);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "relay-proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("relay-proxy shut down gracefully");
    Ok(())
}

/// Handler for `/`: relay the request to the address in `?url=`.
///
/// Dropping this future (caller hung up) drops the outbound request with it.
async fn handle_forward(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let correlation_id = correlation::generate_id();
    let span = relay_tracing::relay_request_span!(&correlation_id, request.method());

    async {
        match relay(&state, request, &correlation_id).await {
            Ok(response) => response,
            Err(e) => {
                // Dispatch failures are already logged inside the forward span.
                if !e.status().is_server_error() {
                    tracing::warn!(error = %e, "Rejected relay request");
                }
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// resolve target → sanitize headers → read body → dispatch and relay.
async fn relay(
    state: &AppState,
    request: Request,
    correlation_id: &str,
) -> Result<Response, ForwardError> {
    let (parts, body) = request.into_parts();

    let url = target::resolve_target(parts.uri.query())?;
    tracing::Span::current().record("target_host", url.host_str().unwrap_or_default());

    let headers = headers::outbound_headers(&parts.headers);

    let body = axum::body::to_bytes(body, state.forward.max_body_bytes)
        .await
        .map_err(|e| ForwardError::BodyRead(e.to_string()))?;

    let outbound = OutboundRequest {
        method: parts.method,
        url,
        headers,
        body,
    };

    forward::forward(&state.client, outbound, correlation_id).await
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn handle_not_found() -> Response {
    ForwardError::NotFound.into_response()
}

async fn handle_method_not_allowed() -> Response {
    ForwardError::MethodNotAllowed.into_response()
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
