//! HTTP server assembly
//!
//! Merges the HTTP API and WebSocket routers into one application sharing a
//! single relay handler.

use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method},
};
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use relay_core::{RelayHandler, ServerConfig};

/// Build the complete application router
pub fn build_app(config: &ServerConfig, relay: RelayHandler) -> anyhow::Result<Router> {
    let cors = cors_layer(config)?;

    Ok(Router::new()
        .merge(relay_api::routes())
        .merge(relay_ws::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(relay))
}

/// Build the CORS layer from the configured origins
fn cors_layer(config: &ServerConfig) -> anyhow::Result<CorsLayer> {
    if config.is_cors_permissive() {
        info!("CORS: allowing any origin");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .flatten()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    info!("CORS: allowing origins {:?}", origins);

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}

/// Serve the application until Ctrl-C
pub async fn serve(config: &ServerConfig, relay: RelayHandler) -> anyhow::Result<()> {
    let app = build_app(config, relay)?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Chat relay listening on {}", listener.local_addr()?);
    info!("WebSocket endpoint: ws://{}/ws/{{client_id}}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chat relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
