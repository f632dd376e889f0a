//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, with OpenAPI/Swagger UI, without loading a `.env`
//! file. The workspace's main `envoy-run` binary is the usual entry point.

use api_rest::{router, AppState, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Envoy REST API server
///
/// # Environment Variables
/// - `ENVOY_REST_ADDR`: Server address (default: "0.0.0.0:8000")
/// - `ENVOY_STRICT_NUMERIC`: Reject malformed amounts (default: false)
/// - `ENVOY_STAMP_SENT_AT`: Stamp envelopes without `sent_at` (default: false)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(ServerConfig::from_env()?);
    let addr = cfg.rest_addr();

    tracing::info!("-- Starting Envoy REST API on {}", addr);

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
