//! OS signal handling.

/// Resolve when the process receives Ctrl+C.
///
/// If the handler cannot be installed this never resolves, so the server
/// keeps running instead of shutting down on a spurious error.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
