mod utils;

use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

pub async fn spawn_service(service_config: &ServiceConfig) {
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    utils::register_panic_logger();
    utils::report_build_info();

    let (graceful_waiter, shutdown_rx) = utils::graceful_shutdown_blocker();

    let state = match ServiceState::from_config(service_config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("error creating server state: {}", e);
            std::process::exit(3);
        }
    };

    let mut handles = Vec::new();

    let listen_addr = service_config.listen_addr();
    let api_config = http_server::Config::new(listen_addr, service_config.log_level);
    let api_state = state.clone();
    let api_rx = shutdown_rx.clone();
    let api_handle = tokio::spawn(async move {
        tracing::info!("Starting console API on {}", listen_addr);
        if let Err(e) = http_server::run(api_config, api_state, api_rx).await {
            tracing::error!("Console API error: {}", e);
        }
    });
    handles.push(api_handle);

    // a backend that never answers must not keep the api from serving
    let resume_state = state.clone();
    let resume_handle = tokio::spawn(async move {
        resume_state.resume_scan().await;
    });

    let _ = graceful_waiter.await;
    resume_handle.abort();

    // stored run keys are kept so the next start resumes the scan
    if state.monitor().is_polling() {
        tracing::info!("scan still in progress, it will resume on next start");
    }

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}
