pub mod error;
pub mod params;
pub mod routes;

pub use error::{ApiError, ApiJson};
pub use routes::{create_router, AppState};

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Settings;

/// Serves the prediction API until ctrl-c.
pub async fn run_server(settings: Settings, port: Option<u16>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::load(&settings.models));
    if !state.predictors.is_loaded() {
        info!("Leak predictors running in dummy mode");
    }

    let app = create_router(state, settings.server.body_limit_bytes);
    let addr = settings
        .server
        .socket_addr(port)
        .with_context(|| format!("invalid listen address {}", settings.server.host))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
