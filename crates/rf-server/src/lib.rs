//! rf-server: the HTTP trigger surface.
//!
//! - `POST /process_video` runs the pipeline once and reports the outcome
//! - `GET /health` for liveness checks
//! - Optional bearer-token guard on the trigger
//! - Graceful shutdown on SIGINT/SIGTERM that cancels in-flight runs

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use rf_core::config::Config;

use crate::context::AppContext;

/// Start the reelforge server and serve until a shutdown signal arrives.
pub async fn start(config: Config) -> rf_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let output_dir = &config.pipeline.output_dir;
    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)?;
        tracing::info!("Created output directory {}", output_dir.display());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| rf_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::from_config(config)?;
    serve(ctx, addr).await
}

/// Serve an already-built context on `addr`.
pub async fn serve(ctx: AppContext, addr: SocketAddr) -> rf_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| rf_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    let shutdown = ctx.shutdown.clone();
    let app = router::build_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(|e| rf_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT, SIGTERM or an external cancel, then cancel `token` so
/// in-flight runs stop at their current stage.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = token.cancelled() => {}
    }

    tracing::info!("Shutdown signal received; cancelling in-flight runs");
    token.cancel();
}
