//! fxtrend-server: HTTP proxy in front of the Frankfurter exchange-rate API.
//!
//! Run with `cargo run -p fxtrend-server`. Listens on `0.0.0.0:5000` unless
//! `FXTREND_BIND` / `FXTREND_PORT` say otherwise.

mod config;
mod error;
mod routes;
mod state;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = (config.bind.clone(), config.port);
    let state = AppState::new(config);
    info!(
        upstream = state.frankfurter.base_url(),
        timeout_ms = state.config.upstream_timeout_ms,
        "forwarding rate lookups"
    );

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind((addr.0.as_str(), addr.1)).await?;
    info!(addr = %listener.local_addr()?, "fxtrend-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("fxtrend-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
