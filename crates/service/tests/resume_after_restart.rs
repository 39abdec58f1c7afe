#![cfg(feature = "testkit")]

use std::sync::Arc;
use std::time::Duration;

use common::prelude::*;
use service::testkit::*;
use service::{MonitorConfig, ServiceState};

fn state_with(store: Arc<FileStore>, backend: Arc<FakeScanBackend>) -> ServiceState {
    ServiceState::new(
        Arc::new(FakeDirectory::default()),
        backend,
        store,
        MonitorConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn scan_resumes_after_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.json");

    // first process starts a scan and goes away while it is running
    {
        let backend = Arc::new(FakeScanBackend::new());
        backend.set_scan_run_id("run-7");
        let state = state_with(Arc::new(FileStore::open(&path)?), backend);

        state.search().set_search_mode(SearchMode::Scan)?;
        state.search().search("passport", Some(ScanLevel::Full)).await?;
        assert!(state.monitor().is_polling());
    }

    let store = FileStore::open(&path)?;
    assert_eq!(store.get(keys::CURRENT_RUN_ID)?.as_deref(), Some("run-7"));
    assert_eq!(store.get(keys::SCAN_STATUS)?.as_deref(), Some("Running"));

    // second process finds the scan finished
    let backend = Arc::new(FakeScanBackend::new());
    backend.push_status(Ok(ScanStatus::Succeeded));
    backend.set_results(&["hr/passport.pdf", "scans/id.png"]);
    let state = state_with(Arc::new(store), backend.clone());

    let view = state.search().view();
    assert_eq!(view.search_mode, SearchMode::Scan);
    assert_eq!(view.search_term.as_deref(), Some("passport"));

    let resumed = state.monitor().resume().await?;
    assert_eq!(
        resumed.and_then(|run| run.run_id).as_deref(),
        Some("run-7")
    );

    let monitor = state.monitor().clone();
    eventually(Duration::from_secs(5), || {
        monitor.snapshot().results.len() == 2
    })
    .await?;
    assert_eq!(backend.result_calls(), 1);
    assert!(!state.monitor().is_polling());

    let reopened = FileStore::open(&path)?;
    let results: Option<Vec<String>> = reopened.get_json(keys::SCAN_RESULTS)?;
    assert_eq!(
        results,
        Some(vec![
            "hr/passport.pdf".to_string(),
            "scans/id.png".to_string()
        ])
    );
    assert_eq!(reopened.get(keys::SEARCH_FOUND)?.as_deref(), Some("true"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn finished_scan_is_restored_without_backend_calls() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.json");
    {
        let store = FileStore::open(&path)?;
        store.set(keys::CURRENT_RUN_ID, "run-9")?;
        store.set(keys::SCAN_STATUS, "Succeeded")?;
        store.set_json(keys::SCAN_RESULTS, &vec!["a.csv".to_string()])?;
    }

    let backend = Arc::new(FakeScanBackend::new());
    let state = state_with(Arc::new(FileStore::open(&path)?), backend.clone());

    let run = state.monitor().resume().await?;
    let run = run.ok_or_else(|| anyhow::anyhow!("nothing was resumed"))?;
    assert_eq!(run.results, vec!["a.csv".to_string()]);
    assert_eq!(run.status, Some(ScanStatus::Succeeded));
    assert_eq!(backend.status_calls(), 0);
    assert_eq!(backend.result_calls(), 0);

    Ok(())
}
