//! Envoy main entry point.
//!
//! Loads `.env`, resolves the server configuration once, and serves the REST API.

use api_rest::{router, AppState, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Envoy application
///
/// # Environment Variables
/// - `ENVOY_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `ENVOY_STRICT_NUMERIC`: Reject malformed amounts instead of keeping their text
/// - `ENVOY_STAMP_SENT_AT`: Stamp envelopes that carry no `sent_at`
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding, or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("envoy=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(ServerConfig::from_env()?);
    let rest_addr = cfg.rest_addr();
    let options = cfg.build_options();

    tracing::info!("++ Starting Envoy REST on {}", rest_addr);
    tracing::info!(
        "++ Amount policy {:?}, stamp sent_at {}",
        options.amount,
        options.stamp_sent_at
    );

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
