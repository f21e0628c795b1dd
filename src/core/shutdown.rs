//! # OS termination signals.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`. **Elsewhere:** Ctrl-C.

/// Completes when a termination signal arrives; `Err` if listeners cannot be installed.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => tracing::debug!("SIGINT received"),
        _ = sigterm.recv() => tracing::debug!("SIGTERM received"),
        _ = sigquit.recv() => tracing::debug!("SIGQUIT received"),
    }
    Ok(())
}

/// Completes when a termination signal arrives; `Err` if listeners cannot be installed.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Like [`wait_for_shutdown_signal`], but never completes when listeners cannot
/// be installed, so callers can race it against other wake-ups.
pub(crate) async fn shutdown_signal_or_pending() {
    if let Err(err) = wait_for_shutdown_signal().await {
        tracing::warn!(error = %err, "cannot listen for termination signals");
        std::future::pending::<()>().await;
    }
}
