use tokio::{
    select,
    signal::unix::{signal, SignalKind},
};
use tracing::{debug, info};

// Functions

/// Resolves once the process receives SIGINT or SIGTERM.
pub async fn wait_for_sigint_or_sigterm() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    debug!("waiting for shutdown signal");
    select! {
        _ = sigint.recv() => {
            debug!("sigint received");
        },
        _ = sigterm.recv() => {
            debug!("sigterm received");
        },
    }
    info!("shutting down");
    Ok(())
}
