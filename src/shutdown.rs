use crate::confirm::ConfirmationHandle;
use tokio::sync::oneshot;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::ctrl_c;

/// Set up signal handlers for graceful shutdown
pub async fn handle_signals(shutdown_send: oneshot::Sender<()>, confirmations: ConfirmationHandle) {
    // Wait for a termination signal
    wait_for_signal().await;

    // Shut down the confirmation store actor
    if let Err(e) = confirmations.shutdown().await {
        error!("Error shutting down confirmation store: {:?}", e);
    } else {
        info!("Confirmation store shut down successfully");
    }

    // Send shutdown signal to the server task
    let _ = shutdown_send.send(());
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() {
    // Handle SIGTERM (sent by the supervisor when stopping the service)
    let mut sigterm =
        signal(SignalKind::terminate()).expect("Failed to create SIGTERM signal handler");
    // Handle SIGINT (Ctrl+C)
    let mut sigint =
        signal(SignalKind::interrupt()).expect("Failed to create SIGINT signal handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
async fn wait_for_signal() {
    let mut ctrl_c = ctrl_c().expect("Failed to create Ctrl+C signal handler");
    ctrl_c.recv().await;
    info!("Received Ctrl+C signal, initiating graceful shutdown");
}
