//! Search view state: which storage is searched, how, and what came back.
//!
//! Keyword and pattern searches answer inline from the connector index.
//!  A scan search only returns a run id, which is handed to the
//!  [`ScanMonitor`] to follow.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use common::prelude::*;

use crate::backend::{
    BackendError, ConnectorDirectory, IndexQuery, ScanBackend, ScanQuery, SearchQuery,
};
use crate::scan_monitor::{MonitorError, ScanMonitor};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchView {
    pub search_type: SearchType,
    pub search_mode: SearchMode,
    pub search_term: Option<String>,
    pub scan_level: Option<ScanLevel>,
    pub hits: Vec<SearchHit>,
    pub loading: bool,
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("enter a search term first")]
    EmptyTerm,
    #[error("a search is already running")]
    Busy,
    #[error("no {0} connector found with an index name")]
    NoConnector(SearchType),
    #[error("scan was accepted but no run id came back")]
    MissingRunId,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Monitor(#[from] MonitorError),
    #[error("failed to persist search state: {0}")]
    Store(#[from] StoreError),
}

pub struct SearchSession {
    directory: Arc<dyn ConnectorDirectory>,
    backend: Arc<dyn ScanBackend>,
    store: Arc<dyn PersistenceStore>,
    monitor: ScanMonitor,
    view: Mutex<SearchView>,
}

impl SearchSession {
    /// Build a session, restoring whatever the store remembers
    pub fn new(
        directory: Arc<dyn ConnectorDirectory>,
        backend: Arc<dyn ScanBackend>,
        store: Arc<dyn PersistenceStore>,
        monitor: ScanMonitor,
    ) -> Self {
        let view = restore(store.as_ref());
        Self {
            directory,
            backend,
            store,
            monitor,
            view: Mutex::new(view),
        }
    }

    pub fn view(&self) -> SearchView {
        self.view.lock().clone()
    }

    pub fn monitor(&self) -> &ScanMonitor {
        &self.monitor
    }

    pub fn set_search_type(&self, search_type: SearchType) -> Result<SearchView, SearchError> {
        self.set_session(Some(search_type), None)
    }

    pub fn set_search_mode(&self, search_mode: SearchMode) -> Result<SearchView, SearchError> {
        self.set_session(None, Some(search_mode))
    }

    /// Switch storage and/or mode.
    ///
    /// A real change abandons the current search: the scan monitor is
    ///  stopped and every search key is cleared.
    pub fn set_session(
        &self,
        search_type: Option<SearchType>,
        search_mode: Option<SearchMode>,
    ) -> Result<SearchView, SearchError> {
        let mut view = self.view.lock();
        if view.loading {
            return Err(SearchError::Busy);
        }
        let search_type = search_type.unwrap_or(view.search_type);
        let search_mode = search_mode.unwrap_or(view.search_mode);
        if search_type == view.search_type && search_mode == view.search_mode {
            return Ok(view.clone());
        }

        tracing::info!(
            search_type = %search_type,
            search_mode = %search_mode,
            "search session changed"
        );
        self.monitor.stop()?;
        clear_search_session(self.store.as_ref())?;
        *view = SearchView {
            search_type,
            search_mode,
            ..Default::default()
        };
        self.store.set(keys::SEARCH_TYPE, search_type.as_str())?;
        self.store.set(keys::SEARCH_MODE, search_mode.as_str())?;
        Ok(view.clone())
    }

    /// Run a search with the current type and mode
    pub async fn search(
        &self,
        term: &str,
        scan_level: Option<ScanLevel>,
    ) -> Result<SearchView, SearchError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(SearchError::EmptyTerm);
        }

        let (search_type, search_mode) = {
            let mut view = self.view.lock();
            if view.loading {
                return Err(SearchError::Busy);
            }
            view.loading = true;
            view.message = None;
            view.hits.clear();
            view.search_term = Some(term.to_string());
            view.scan_level = scan_level;
            (view.search_type, view.search_mode)
        };

        let result = self.run(search_type, search_mode, term, scan_level).await;

        let mut view = self.view.lock();
        view.loading = false;
        match result {
            Ok((hits, message)) => {
                view.hits = hits;
                view.message = Some(message);
                Ok(view.clone())
            }
            Err(e) => {
                view.message = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        search_type: SearchType,
        search_mode: SearchMode,
        term: &str,
        scan_level: Option<ScanLevel>,
    ) -> Result<(Vec<SearchHit>, String), SearchError> {
        self.store.set(keys::SEARCH_TERM, term)?;
        match scan_level {
            Some(level) => self.store.set(keys::SCAN_LEVEL, level.as_str())?,
            None => self.store.remove(keys::SCAN_LEVEL)?,
        }

        let hits = match search_mode {
            SearchMode::Keyword => self.keyword(search_type, term).await?,
            SearchMode::Pattern => self.pattern(search_type, term).await?,
            SearchMode::Scan => {
                let query = SearchQuery::Scan(ScanQuery {
                    keyword: term.to_string(),
                    scan_level: scan_level.unwrap_or_default(),
                });
                let response = self.backend.search(&query).await?;
                let run_id = response
                    .run_id()
                    .map(str::to_string)
                    .ok_or(SearchError::MissingRunId)?;
                tracing::info!(run_id = %run_id, "scan requested");
                let run = self.monitor.start(&run_id).await?;
                let message = run
                    .status_message
                    .unwrap_or_else(|| ScanStatus::Running.message());
                return Ok((Vec::new(), message));
            }
        };

        self.store.set_json(keys::SEARCH_FOUND, &!hits.is_empty())?;
        let message = if hits.is_empty() {
            format!("No results found for \"{}\" in {} storage", term, search_type)
        } else {
            format!(
                "Found {} results for \"{}\" in {} storage",
                hits.len(),
                term,
                search_type
            )
        };
        Ok((hits, message))
    }

    async fn connectors_of(&self, search_type: SearchType) -> Result<Vec<Connector>, SearchError> {
        let wanted = search_type.connector_type();
        let connectors: Vec<Connector> = self
            .directory
            .list_connectors()
            .await?
            .into_iter()
            .filter(|c| c.connector_type == wanted && !c.name.is_empty())
            .collect();
        if connectors.is_empty() {
            return Err(SearchError::NoConnector(search_type));
        }
        Ok(connectors)
    }

    /// Query every connector of the type; a connector that fails is
    ///  logged and skipped
    async fn keyword(&self, search_type: SearchType, term: &str) -> Result<Vec<SearchHit>, SearchError> {
        let connectors = self.connectors_of(search_type).await?;

        let queries = connectors.iter().map(|connector| {
            let query = SearchQuery::Index(IndexQuery::Keyword {
                keyword: term.to_string(),
                index_name: connector.name.clone(),
            });
            async move { (connector, self.backend.search(&query).await) }
        });

        let mut hits = Vec::new();
        for (connector, answer) in join_all(queries).await {
            match answer {
                Ok(response) => hits.extend(
                    response
                        .into_hits()
                        .into_iter()
                        .map(|raw| SearchHit::from_raw(connector.connector_type, &connector.name, raw)),
                ),
                Err(e) => {
                    tracing::warn!(connector_id = %connector.id, "search failed for connector: {}", e);
                }
            }
        }
        Ok(hits)
    }

    async fn pattern(&self, search_type: SearchType, term: &str) -> Result<Vec<SearchHit>, SearchError> {
        let connectors = self.connectors_of(search_type).await?;
        let Some(connector) = connectors.into_iter().next() else {
            return Err(SearchError::NoConnector(search_type));
        };

        let query = SearchQuery::Index(IndexQuery::Pattern {
            pattern: term.to_string(),
            index_name: connector.name.clone(),
        });
        let response = self.backend.search(&query).await?;
        Ok(response
            .into_hits()
            .into_iter()
            .map(|raw| SearchHit::from_raw(connector.connector_type, &connector.name, raw))
            .collect())
    }

    /// Drop the term and the results, keep type and mode
    pub fn clear(&self) -> Result<SearchView, SearchError> {
        let mut view = self.view.lock();
        if view.loading {
            return Err(SearchError::Busy);
        }
        for key in [
            keys::SEARCH_TERM,
            keys::SCAN_LEVEL,
            keys::FILE_PATH,
            keys::SEARCH_FOUND,
        ] {
            self.store.remove(key)?;
        }
        view.search_term = None;
        view.scan_level = None;
        view.hits.clear();
        view.message = None;
        Ok(view.clone())
    }
}

fn restore(store: &dyn PersistenceStore) -> SearchView {
    fn read(store: &dyn PersistenceStore, key: &str) -> Option<String> {
        store.get(key).unwrap_or_else(|e| {
            tracing::warn!("failed to read {}: {}", key, e);
            None
        })
    }

    SearchView {
        search_type: read(store, keys::SEARCH_TYPE)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default(),
        search_mode: read(store, keys::SEARCH_MODE)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default(),
        search_term: read(store, keys::SEARCH_TERM),
        scan_level: read(store, keys::SCAN_LEVEL).and_then(|raw| raw.parse().ok()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_monitor::MonitorConfig;
    use crate::testkit::{connector, FakeDirectory, FakeScanBackend};

    struct Harness {
        directory: Arc<FakeDirectory>,
        backend: Arc<FakeScanBackend>,
        store: Arc<MemoryStore>,
        session: SearchSession,
    }

    fn harness(connectors: Vec<Connector>) -> Harness {
        let directory = Arc::new(FakeDirectory::new(connectors, true));
        let backend = Arc::new(FakeScanBackend::new());
        let store = Arc::new(MemoryStore::new());
        let monitor = ScanMonitor::new(backend.clone(), store.clone(), MonitorConfig::default());
        let session = SearchSession::new(directory.clone(), backend.clone(), store.clone(), monitor);
        Harness {
            directory,
            backend,
            store,
            session,
        }
    }

    fn named(id: &str, name: &str, connector_type: ConnectorType) -> Connector {
        let mut c = connector(id, connector_type, ConnectorStatus::Connected);
        c.name = name.to_string();
        c
    }

    fn raw(id: &str) -> RawHit {
        RawHit {
            id: id.to_string(),
            container: Some("payroll".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_keyword_search_skips_failing_connector() {
        let h = harness(vec![
            named("c1", "aws-east", ConnectorType::S3),
            named("c2", "aws-west", ConnectorType::S3),
            named("c3", "azure", ConnectorType::AzureBlobStorage),
        ]);
        h.session.set_search_type(CloudKind::Aws).unwrap();
        h.backend.set_hits("aws-east", Ok(vec![raw("a"), raw("b")]));
        h.backend
            .set_hits("aws-west", Err(BackendError::Rejected("index missing".into())));

        let view = h.session.search("  salary ", None).await.unwrap();

        assert_eq!(h.backend.queries().len(), 2);
        assert_eq!(view.hits.len(), 2);
        assert!(view.hits.iter().all(|hit| matches!(hit, SearchHit::S3(_))));
        assert_eq!(view.search_term.as_deref(), Some("salary"));
        assert_eq!(
            view.message.as_deref(),
            Some("Found 2 results for \"salary\" in AWS storage")
        );
        assert_eq!(
            h.store.get(keys::SEARCH_TERM).unwrap().as_deref(),
            Some("salary")
        );
        assert_eq!(
            h.store.get(keys::SEARCH_FOUND).unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_blank_term_issues_nothing() {
        let h = harness(vec![named("c1", "aws", ConnectorType::S3)]);
        assert!(matches!(
            h.session.search("   ", None).await,
            Err(SearchError::EmptyTerm)
        ));
        assert!(h.backend.queries().is_empty());
        assert!(h.directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pattern_needs_connector_of_type() {
        let h = harness(vec![named("c1", "aws", ConnectorType::S3)]);
        h.session.set_search_mode(SearchMode::Pattern).unwrap();

        let err = h.session.search(r"\d{3}-\d{2}-\d{4}", None).await.unwrap_err();
        assert!(matches!(err, SearchError::NoConnector(CloudKind::Azure)));
        assert!(h.backend.queries().is_empty());

        h.session.set_search_type(CloudKind::Aws).unwrap();
        h.backend.set_hits("aws", Ok(vec![raw("ssn.csv")]));
        let view = h.session.search(r"\d{3}-\d{2}-\d{4}", None).await.unwrap();
        assert_eq!(view.hits.len(), 1);
        assert_eq!(
            h.backend.queries(),
            vec![SearchQuery::Index(IndexQuery::Pattern {
                pattern: r"\d{3}-\d{2}-\d{4}".to_string(),
                index_name: "aws".to_string(),
            })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_search_hands_run_to_monitor() {
        let h = harness(vec![]);
        h.session.set_search_mode(SearchMode::Scan).unwrap();
        h.backend.set_scan_run_id("run-42");

        let view = h
            .session
            .search("passport", Some(ScanLevel::Incremental))
            .await
            .unwrap();
        assert!(view.hits.is_empty());
        assert_eq!(view.message.as_deref(), Some("Scan in progress..."));
        assert_eq!(
            h.session.monitor().snapshot().run_id.as_deref(),
            Some("run-42")
        );
        assert_eq!(
            h.store.get(keys::CURRENT_RUN_ID).unwrap().as_deref(),
            Some("run-42")
        );
        assert_eq!(
            h.store.get(keys::SCAN_LEVEL).unwrap().as_deref(),
            Some("Incremental")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_change_stops_scan_and_clears_keys() {
        let h = harness(vec![]);
        h.store.set(keys::USERNAME, "operator").unwrap();
        h.session.set_search_mode(SearchMode::Scan).unwrap();
        h.backend.set_scan_run_id("run-42");
        h.session.search("passport", None).await.unwrap();
        assert!(h.session.monitor().is_polling());

        let view = h.session.set_search_type(CloudKind::Aws).unwrap();
        assert_eq!(view.search_type, CloudKind::Aws);
        assert_eq!(view.search_mode, SearchMode::Scan);
        assert!(view.search_term.is_none());

        assert!(!h.session.monitor().is_polling());
        assert!(h.session.monitor().snapshot().is_idle());
        assert_eq!(h.store.get(keys::CURRENT_RUN_ID).unwrap(), None);
        assert_eq!(h.store.get(keys::SEARCH_TERM).unwrap(), None);
        assert_eq!(
            h.store.get(keys::SEARCH_TYPE).unwrap().as_deref(),
            Some("AWS")
        );
        assert_eq!(
            h.store.get(keys::USERNAME).unwrap().as_deref(),
            Some("operator")
        );
    }

    #[tokio::test]
    async fn test_session_is_restored_from_store() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SEARCH_TYPE, "AWS").unwrap();
        store.set(keys::SEARCH_MODE, "pattern").unwrap();
        store.set(keys::SEARCH_TERM, "iban").unwrap();

        let backend = Arc::new(FakeScanBackend::new());
        let monitor = ScanMonitor::new(backend.clone(), store.clone(), MonitorConfig::default());
        let session = SearchSession::new(
            Arc::new(FakeDirectory::default()),
            backend,
            store.clone(),
            monitor,
        );

        let view = session.view();
        assert_eq!(view.search_type, CloudKind::Aws);
        assert_eq!(view.search_mode, SearchMode::Pattern);
        assert_eq!(view.search_term.as_deref(), Some("iban"));

        let view = session.clear().unwrap();
        assert!(view.search_term.is_none());
        assert_eq!(store.get(keys::SEARCH_TERM).unwrap(), None);
        assert_eq!(store.get(keys::SEARCH_TYPE).unwrap().as_deref(), Some("AWS"));
    }
}
