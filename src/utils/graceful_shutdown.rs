use tokio::signal;

/// Represents different shutdown reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
}

/// Resolve once the process is asked to stop.
///
/// Meant for `axum::serve(..).with_graceful_shutdown(..)`: in-flight requests
/// finish, new connections are refused.
pub async fn shutdown_signal() -> ShutdownReason {
    let reason = tokio::select! {
        _ = wait_for_ctrl_c() => ShutdownReason::Interrupt,
        _ = wait_for_sigterm() => ShutdownReason::Terminate,
    };
    tracing::info!("Shutdown signal received: {:?}", reason);
    reason
}

async fn wait_for_ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::error!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // On non-Unix systems, we only have Ctrl+C
    std::future::pending::<()>().await;
}
