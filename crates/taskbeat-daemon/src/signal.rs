//! OS shutdown signals.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::DaemonError;

/// A token cancelled on the first SIGTERM or SIGINT.
///
/// Must be called from within a tokio runtime.
#[cfg(unix)]
pub fn shutdown_token() -> Result<CancellationToken, DaemonError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
    let mut sigint =
        signal(SignalKind::interrupt()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
            _ = trigger.cancelled() => return,
        }
        trigger.cancel();
    });

    info!("OS signal handlers installed (SIGTERM, SIGINT)");
    Ok(token)
}

#[cfg(not(unix))]
pub fn shutdown_token() -> Result<CancellationToken, DaemonError> {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("Received Ctrl+C");
                    trigger.cancel();
                }
            }
            _ = trigger.cancelled() => {}
        }
    });

    info!("OS signal handlers installed (Ctrl+C only)");
    Ok(token)
}
