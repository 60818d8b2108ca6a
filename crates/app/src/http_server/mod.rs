use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use common::channel::Channel;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
mod config;
mod handlers;
mod health;

pub use config::Config;

const API_PREFIX: &str = "/api";
const STATUS_PREFIX: &str = "/_status";

/// Maximum request size in bytes; a publish carries a single unit
pub const MAX_REQUEST_SIZE_BYTES: usize = 64 * 1024;

/// Shared state of the provider routes
#[derive(Debug, Clone)]
pub struct ProviderState {
    channel: Arc<dyn Channel>,
}

impl ProviderState {
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }
}

/// The provider's routes: `/_status/livez`, `/api/v0/publish`, `/api/v0/fetch`
pub fn router(state: ProviderState, log_level: tracing::Level) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    // browser editors talk to providers directly
    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, ORIGIN, CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .nest(STATUS_PREFIX, health::router())
        .nest(API_PREFIX, api::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_SIZE_BYTES))
        .layer(cors)
        .with_state(state)
        .layer(trace_layer)
}

/// Serve the provider on an already bound listener until `shutdown_rx` fires.
pub async fn serve(
    listener: TcpListener,
    state: ProviderState,
    log_level: tracing::Level,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let router = router(state, log_level);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

/// Bind `config.listen_addr` and serve the provider.
pub async fn run(
    config: Config,
    state: ProviderState,
    shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = ?config.listen_addr, "provider listening");

    serve(listener, state, config.log_level, shutdown_rx).await
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
