//! In-memory stand-ins for the dashboard backend.
//!
//! Both fakes record every call so tests can assert on exactly which
//!  requests a flow issued.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use tokio::sync::Notify;

use common::prelude::*;

use crate::backend::{
    BackendError, ConfigureResponse, ConnectorDirectory, CreateOutcome, CreatedConnector,
    DeleteResponse, IndexQuery, ScanBackend, SearchQuery, SearchResponse, SyncResponse,
};
use crate::backend::requests::{ConfigureResult, SearchData, SearchResults};

/// Poll `check` until it holds or `timeout` elapses
pub async fn eventually<F>(timeout: Duration, mut check: F) -> anyhow::Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    let mut delay = Duration::from_millis(10);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return Ok(());
        }
        tokio::time::sleep(delay).await;
        delay = std::cmp::min(delay * 2, Duration::from_millis(200));
    }
    anyhow::bail!("condition not met within timeout")
}

pub fn connector(id: &str, connector_type: ConnectorType, status: ConnectorStatus) -> Connector {
    Connector {
        id: id.to_string(),
        connector_type,
        name: connector_type.kind().as_str().to_string(),
        status,
    }
}

/// Connector directory that behaves like a well mannered backend:
///  created connectors show up in the listing, configure and sync move
///  them along, delete removes them.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    connectors: Mutex<Vec<Connector>>,
    dashboard_data: AtomicBool,
    created: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, BackendError>>,
    create_status: Mutex<Option<StatusCode>>,
    configure_result: Mutex<Option<String>>,
    sync_status: Mutex<Option<String>>,
    last_configuration: Mutex<Option<ConfigurationBody>>,
}

impl FakeDirectory {
    pub fn new(connectors: Vec<Connector>, dashboard_data: bool) -> Self {
        let directory = Self::default();
        *directory.connectors.lock() = connectors;
        directory.dashboard_data.store(dashboard_data, Ordering::SeqCst);
        directory
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == op).count()
    }

    pub fn connectors(&self) -> Vec<Connector> {
        self.connectors.lock().clone()
    }

    /// Fail the next call to `op` with `err`
    pub fn fail_next(&self, op: &'static str, err: BackendError) {
        self.failures.lock().insert(op, err);
    }

    /// Answer create calls with `status` instead of 201
    pub fn set_create_status(&self, status: StatusCode) {
        *self.create_status.lock() = Some(status);
    }

    /// Answer configure calls with `result` instead of "updated"
    pub fn set_configure_result(&self, result: &str) {
        *self.configure_result.lock() = Some(result.to_string());
    }

    /// Answer sync calls with `status` instead of "completed"
    pub fn set_sync_status(&self, status: &str) {
        *self.sync_status.lock() = Some(status.to_string());
    }

    pub fn last_configuration(&self) -> Option<ConfigurationBody> {
        self.last_configuration.lock().clone()
    }

    fn record(&self, op: &'static str) -> Result<(), BackendError> {
        self.calls.lock().push(op);
        match self.failures.lock().remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn set_status(&self, connector_id: &str, status: ConnectorStatus) {
        if let Some(c) = self
            .connectors
            .lock()
            .iter_mut()
            .find(|c| c.id == connector_id)
        {
            c.status = status;
        }
    }
}

#[async_trait]
impl ConnectorDirectory for FakeDirectory {
    async fn list_connectors(&self) -> Result<Vec<Connector>, BackendError> {
        self.record("list")?;
        Ok(self.connectors())
    }

    async fn dashboard_data_exists(&self) -> Result<bool, BackendError> {
        self.record("dashboard")?;
        Ok(self.dashboard_data.load(Ordering::SeqCst))
    }

    async fn create_connector(&self, kind: CloudKind) -> Result<CreateOutcome, BackendError> {
        self.record("create")?;
        let status = self.create_status.lock().unwrap_or(StatusCode::CREATED);
        if status != StatusCode::CREATED {
            return Ok(CreateOutcome {
                status,
                connector: None,
                message: Some("connector could not be created".to_string()),
            });
        }

        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let created = connector(&format!("c{}", n), kind.connector_type(), ConnectorStatus::Created);
        self.connectors.lock().push(created.clone());
        Ok(CreateOutcome {
            status,
            connector: Some(CreatedConnector {
                id: created.id,
                connector_type: created.connector_type,
                name: created.name,
            }),
            message: None,
        })
    }

    async fn configure_connector(
        &self,
        connector_id: &str,
        body: &ConfigurationBody,
    ) -> Result<ConfigureResponse, BackendError> {
        self.record("configure")?;
        *self.last_configuration.lock() = Some(body.clone());
        let result = self
            .configure_result
            .lock()
            .clone()
            .unwrap_or_else(|| "updated".to_string());
        if result == "updated" {
            self.set_status(connector_id, ConnectorStatus::Configured);
        }
        Ok(ConfigureResponse {
            data: Some(ConfigureResult {
                result: Some(result),
            }),
            message: Some("configuration was not applied".to_string()),
        })
    }

    async fn sync_connector(&self, connector_id: &str) -> Result<SyncResponse, BackendError> {
        self.record("sync")?;
        let status = self
            .sync_status
            .lock()
            .clone()
            .unwrap_or_else(|| "completed".to_string());
        if status == "completed" {
            self.set_status(connector_id, ConnectorStatus::Connected);
            self.dashboard_data.store(true, Ordering::SeqCst);
        }
        Ok(SyncResponse {
            syncstatus: Some(status),
            message: Some("sync did not complete".to_string()),
        })
    }

    async fn delete_connector(&self, connector_id: &str) -> Result<DeleteResponse, BackendError> {
        self.record("delete")?;
        let mut connectors = self.connectors.lock();
        let before = connectors.len();
        connectors.retain(|c| c.id != connector_id);
        Ok(DeleteResponse {
            acknowledged: connectors.len() != before,
            message: Some(format!("connector {} not found", connector_id)),
        })
    }
}

/// Scan backend with scripted status answers.
///
/// Status answers are consumed from a queue; once it is drained the
///  last answer repeats.
#[derive(Debug, Default)]
pub struct FakeScanBackend {
    statuses: Mutex<VecDeque<Result<ScanStatus, BackendError>>>,
    last_status: Mutex<Option<Result<ScanStatus, BackendError>>>,
    results: Mutex<Vec<String>>,
    results_error: Mutex<Option<BackendError>>,
    status_calls: AtomicUsize,
    result_calls: AtomicUsize,
    hold_status: AtomicBool,
    release: Notify,
    hits: Mutex<HashMap<String, Result<Vec<RawHit>, BackendError>>>,
    scan_run_id: Mutex<Option<String>>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl FakeScanBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, status: Result<ScanStatus, BackendError>) {
        self.statuses.lock().push_back(status);
    }

    pub fn set_results(&self, results: &[&str]) {
        *self.results.lock() = results.iter().map(|r| r.to_string()).collect();
    }

    /// Make every result fetch fail with `err`
    pub fn set_results_error(&self, err: BackendError) {
        *self.results_error.lock() = Some(err);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }

    /// Park status checks until `release` is called
    pub fn hold_status_checks(&self) {
        self.hold_status.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.hold_status.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    pub fn set_hits(&self, index_name: &str, hits: Result<Vec<RawHit>, BackendError>) {
        self.hits.lock().insert(index_name.to_string(), hits);
    }

    pub fn set_scan_run_id(&self, run_id: &str) {
        *self.scan_run_id.lock() = Some(run_id.to_string());
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ScanBackend for FakeScanBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, BackendError> {
        self.queries.lock().push(query.clone());
        match query {
            SearchQuery::Index(IndexQuery::Keyword { index_name, .. })
            | SearchQuery::Index(IndexQuery::Pattern { index_name, .. }) => {
                let hits = self
                    .hits
                    .lock()
                    .get(index_name)
                    .cloned()
                    .unwrap_or_else(|| Ok(Vec::new()))?;
                Ok(SearchResponse {
                    data: Some(SearchData {
                        data: Some(SearchResults { results: hits }),
                        purview_run_id: None,
                    }),
                    ..Default::default()
                })
            }
            SearchQuery::Scan(_) => Ok(SearchResponse {
                purview_run_id: self.scan_run_id.lock().clone(),
                ..Default::default()
            }),
        }
    }

    async fn scan_status(&self, _run_id: &str) -> Result<ScanStatus, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let answer = {
            let mut statuses = self.statuses.lock();
            let mut last = self.last_status.lock();
            if let Some(next) = statuses.pop_front() {
                *last = Some(next);
            }
            last.clone()
                .unwrap_or_else(|| Ok(ScanStatus::Running))
        };
        if self.hold_status.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        answer
    }

    async fn scan_results(&self, _run_id: &str) -> Result<Vec<String>, BackendError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.results_error.lock().clone() {
            return Err(err);
        }
        Ok(self.results.lock().clone())
    }
}
