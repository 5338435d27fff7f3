//! OS signal handling.
//!
//! - SIGTERM/SIGINT → graceful shutdown
//! - SIGHUP → clear the module cache (unix only), not shutdown

use std::sync::Arc;

use crate::modules::ModuleCache;

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Clear `cache` every time the process receives SIGHUP.
#[cfg(unix)]
pub fn clear_cache_on_hangup(
    cache: Arc<ModuleCache>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            let evicted = cache.clear();
            tracing::info!(evicted, "SIGHUP received, module cache cleared");
        }
    }))
}

#[cfg(not(unix))]
pub fn clear_cache_on_hangup(
    _cache: Arc<ModuleCache>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(async {}))
}
