use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
mod config;
mod gateway;
mod handlers;

pub use config::Config;

use crate::ServiceState;

const API_PREFIX: &str = "/api";
const STATUS_PREFIX: &str = "/_status";

/// Maximum request body size in bytes (500 MB). Multipart batch sizes
/// larger than this cannot transit the gateway.
pub const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;

/// Assemble the API router (serves /_status + /api routes).
pub fn api_router(config: &Config, state: ServiceState) -> Router {
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .nest(API_PREFIX, api::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .with_state(state)
        .layer(trace_layer)
}

/// Run the API HTTP server (private, catalog operations).
pub async fn run_api(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let router = api_router(&config, state);

    tracing::info!(addr = ?listen_addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

/// Assemble the gateway router (serves /_status + /o object routes).
pub fn gateway_router(config: &Config, state: ServiceState) -> Router {
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    // Object CORS: browsers fetch signed read URLs cross-origin, and
    // uploads ride the same scheme, so PUT is allowed too.
    let object_cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::PUT])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    let object_routes = Router::new()
        .route(
            "/:bucket/*key",
            get(gateway::get_object).put(gateway::put_object),
        )
        .with_state(state.clone())
        .layer(object_cors);

    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .nest("/o", object_routes)
        .fallback(handlers::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .with_state(state)
        .layer(trace_layer)
}

/// Run the gateway HTTP server (public, signed object transfers only;
/// requests authenticate with the URL signature, not a bearer token).
pub async fn run_gateway(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let router = gateway_router(&config, state);

    tracing::info!(addr = ?listen_addr, "Gateway server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

mod health;

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
