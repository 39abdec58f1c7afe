use std::sync::Arc;

use common::prelude::*;

use super::backend::{ConnectorDirectory, HttpBackend, ScanBackend};
use super::config::Config;
use super::http_server::api::client::ApiError;
use super::scan_monitor::{MonitorConfig, ScanMonitor};
use super::search::SearchSession;
use super::setup_flow::ConnectorSetupFlow;

/// Everything the console API handlers share.
///
/// One store is opened per process and handed to every flow.
#[derive(Clone)]
pub struct State {
    setup: Arc<ConnectorSetupFlow>,
    search: Arc<SearchSession>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let store: Arc<dyn PersistenceStore> = match config.state_path {
            Some(ref path) => {
                tracing::info!("State file: {}", path.display());
                Arc::new(FileStore::open(path)?)
            }
            // otherwise just keep state in memory
            None => Arc::new(MemoryStore::new()),
        };

        let backend = Arc::new(HttpBackend::from_config(config)?);
        tracing::info!("Dashboard backend: {}", backend.remote());

        Ok(Self::new(backend.clone(), backend, store, config.monitor()))
    }

    /// Pick up a scan left running by a previous process.
    ///
    /// Waits on the backend, so callers start serving before awaiting it.
    pub async fn resume_scan(&self) {
        match self.monitor().resume().await {
            Ok(Some(run)) => tracing::info!(
                "Resumed scan {:?} ({:?})",
                run.run_id,
                run.status_message
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!("could not resume scan: {}", e),
        }
    }

    pub fn new(
        directory: Arc<dyn ConnectorDirectory>,
        backend: Arc<dyn ScanBackend>,
        store: Arc<dyn PersistenceStore>,
        monitor_config: MonitorConfig,
    ) -> Self {
        let monitor = ScanMonitor::new(backend.clone(), store.clone(), monitor_config);
        let setup = ConnectorSetupFlow::new(directory.clone());
        let search = SearchSession::new(directory, backend, store, monitor);
        Self {
            setup: Arc::new(setup),
            search: Arc::new(search),
        }
    }

    pub fn setup(&self) -> &ConnectorSetupFlow {
        &self.setup
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn monitor(&self) -> &ScanMonitor {
        self.search.monitor()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("State store error: {0}")]
    Store(#[from] StoreError),
    #[error("Backend client error: {0}")]
    Client(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    #[tokio::test]
    async fn test_from_config_does_not_wait_on_a_hung_backend() {
        // accepts connections and never answers them
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let holder = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let store = FileStore::open(&path).unwrap();
            store.set(keys::CURRENT_RUN_ID, "run-1").unwrap();
            store.set(keys::SCAN_STATUS, "Running").unwrap();
        }
        let mut config = Config::new(Url::parse(&format!("http://{}", addr)).unwrap());
        config.state_path = Some(path);

        let state = tokio::time::timeout(Duration::from_secs(5), State::from_config(&config))
            .await
            .expect("state was built without waiting on the backend")
            .unwrap();
        assert!(state.monitor().snapshot().is_idle());

        let resume = tokio::spawn({
            let state = state.clone();
            async move { state.resume_scan().await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;

        // the stored run is tracked while its first check hangs
        assert!(!resume.is_finished());
        let run = state.monitor().snapshot();
        assert_eq!(run.run_id.as_deref(), Some("run-1"));
        assert!(run.loading);

        resume.abort();
        holder.abort();
    }
}
