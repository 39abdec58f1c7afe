//! Contracts with the dashboard backend.
//!
//! The flows only see the two traits below; `HttpBackend` is the
//!  production implementation and the tests swap in in-memory fakes.

use async_trait::async_trait;
use http::StatusCode;

use common::prelude::{CloudKind, ConfigurationBody, Connector, ScanStatus};

use crate::http_server::api::client::ApiError;

mod remote;
pub mod requests;

pub use remote::HttpBackend;
pub use requests::{
    ConfigureResponse, CreatedConnector, DeleteResponse, IndexQuery, ScanQuery, SearchQuery,
    SearchResponse, SyncResponse,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend answered and said no
    #[error("{0}")]
    Rejected(String),
    /// The backend could not be reached or its answer could not be read
    #[error("unable to reach the backend: {0}")]
    Transport(String),
}

impl From<ApiError> for BackendError {
    fn from(err: ApiError) -> Self {
        if err.is_rejection() {
            BackendError::Rejected(err.message())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Answer to a create-connector call, with the status it came back on
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub status: StatusCode,
    pub connector: Option<CreatedConnector>,
    pub message: Option<String>,
}

/// Source of truth for connectors and their lifecycle
#[async_trait]
pub trait ConnectorDirectory: Send + Sync {
    async fn list_connectors(&self) -> Result<Vec<Connector>, BackendError>;
    /// Whether aggregate dashboard data exists (false on "not found")
    async fn dashboard_data_exists(&self) -> Result<bool, BackendError>;
    async fn create_connector(&self, kind: CloudKind) -> Result<CreateOutcome, BackendError>;
    async fn configure_connector(
        &self,
        connector_id: &str,
        body: &ConfigurationBody,
    ) -> Result<ConfigureResponse, BackendError>;
    async fn sync_connector(&self, connector_id: &str) -> Result<SyncResponse, BackendError>;
    async fn delete_connector(&self, connector_id: &str) -> Result<DeleteResponse, BackendError>;
}

/// Search and classification scans
#[async_trait]
pub trait ScanBackend: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, BackendError>;
    async fn scan_status(&self, run_id: &str) -> Result<ScanStatus, BackendError>;
    async fn scan_results(&self, run_id: &str) -> Result<Vec<String>, BackendError>;
}
