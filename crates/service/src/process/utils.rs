use tokio::sync::watch;
use tokio::task::JoinHandle;

use common::prelude::BuildInfo;

/// Route panics through tracing so they land next to the rest of the logs
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(location) => {
            tracing::error!(
                message = %panic,
                panic.file = location.file(),
                panic.line = location.line(),
                panic.column = location.column(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}

pub fn report_build_info() {
    let build = BuildInfo::new();

    tracing::info!(
        build_profile = ?build.build_profile,
        features = ?build.build_features,
        version = ?build.version,
        git_hash = ?build.git_hash,
        "service starting up"
    );
}

/// Wait for ctrl-c, then tell every listener to wind down.
///
/// The returned handle resolves once the signal has been broadcast.
pub fn graceful_shutdown_blocker() -> (JoinHandle<()>, watch::Receiver<()>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("shutdown signal received, stopping services");
        let _ = shutdown_tx.send(());
    });

    (handle, shutdown_rx)
}
