//! Tracks one remote scan until it finishes.
//!
//! Every change to the run id, status or status message is written to
//!  the [`PersistenceStore`] while the in-memory lock is held, so a
//!  restarted console can pick the scan back up with [`ScanMonitor::resume`].
//!
//! Each start/stop bumps a generation number. Anything that was in
//!  flight for an older generation is dropped when it comes back.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use common::prelude::*;

use crate::backend::ScanBackend;

mod task;

pub use task::CancellableTask;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Time between interval-driven status checks
    pub poll_interval: Duration,
    /// Wait between a `Succeeded` status and the result fetch
    pub settle_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("run id must not be empty")]
    EmptyRunId,
    #[error("failed to persist scan state: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ScanMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn ScanBackend>,
    store: Arc<dyn PersistenceStore>,
    config: MonitorConfig,
    tracked: Mutex<Tracked>,
}

#[derive(Default)]
struct Tracked {
    run: ScanRun,
    generation: u64,
    results_fetched: bool,
    poller: CancellableTask,
}

impl Tracked {
    /// Forget the current run and invalidate everything in flight for it
    fn reset(&mut self) -> u64 {
        self.poller.cancel();
        self.generation += 1;
        self.run = ScanRun::default();
        self.results_fetched = false;
        self.generation
    }
}

enum Check {
    KeepPolling,
    Succeeded,
    Finished,
    Stale,
}

enum Resume {
    Poll(u64),
    Fetch(u64),
    Restored,
}

impl ScanMonitor {
    pub fn new(
        backend: Arc<dyn ScanBackend>,
        store: Arc<dyn PersistenceStore>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                config,
                tracked: Mutex::new(Tracked::default()),
            }),
        }
    }

    pub fn snapshot(&self) -> ScanRun {
        self.inner.tracked.lock().run.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.tracked.lock().poller.is_active()
    }

    /// Begin monitoring `run_id`, replacing whatever was monitored before.
    ///
    /// Checks the status right away; the interval only starts if that
    ///  first answer is not terminal.
    pub async fn start(&self, run_id: &str) -> Result<ScanRun, MonitorError> {
        let run_id = run_id.trim();
        if run_id.is_empty() {
            return Err(MonitorError::EmptyRunId);
        }

        let generation = {
            let mut tracked = self.inner.tracked.lock();
            let generation = tracked.reset();
            tracked.run = ScanRun {
                run_id: Some(run_id.to_string()),
                status: Some(ScanStatus::Running),
                status_message: Some(ScanStatus::Running.message()),
                loading: true,
                ..Default::default()
            };
            self.inner.store.remove(keys::SCAN_RESULTS)?;
            self.inner.store.remove(keys::SEARCH_FOUND)?;
            self.inner.persist(&tracked.run)?;
            generation
        };

        tracing::info!(run_id, "monitoring scan");
        Ok(self
            .inner
            .check_then_poll(generation, run_id.to_string())
            .await)
    }

    /// Pick up a scan recorded in the store by a previous process.
    ///
    /// A stored non-terminal status gets an immediate check instead of
    ///  waiting for the first interval. Does nothing if that run is
    ///  already being monitored.
    pub async fn resume(&self) -> Result<Option<ScanRun>, MonitorError> {
        let store = &self.inner.store;
        let Some(run_id) = store.get(keys::CURRENT_RUN_ID)? else {
            return Ok(None);
        };
        let status = store
            .get(keys::SCAN_STATUS)?
            .map(ScanStatus::from)
            .unwrap_or(ScanStatus::Running);
        let message = store.get(keys::SCAN_STATUS_MESSAGE)?;
        let results: Option<Vec<String>> = store.get_json(keys::SCAN_RESULTS)?;

        let next = {
            let mut tracked = self.inner.tracked.lock();
            if tracked.run.run_id.as_deref() == Some(run_id.as_str()) {
                tracing::debug!(run_id = %run_id, "scan already monitored, nothing to resume");
                return Ok(Some(tracked.run.clone()));
            }

            let generation = tracked.reset();
            tracked.run = ScanRun {
                run_id: Some(run_id.clone()),
                status: Some(status.clone()),
                status_message: message.or_else(|| Some(status.message())),
                results: results.clone().unwrap_or_default(),
                ..Default::default()
            };

            match &status {
                ScanStatus::Succeeded if results.is_some() => {
                    tracked.results_fetched = true;
                    Resume::Restored
                }
                ScanStatus::Succeeded => {
                    tracked.run.loading = true;
                    Resume::Fetch(generation)
                }
                ScanStatus::Failed => {
                    tracked.generation += 1;
                    tracked.run.run_id = None;
                    self.inner.clear_run_keys()?;
                    Resume::Restored
                }
                _ => {
                    tracked.run.loading = true;
                    Resume::Poll(generation)
                }
            }
        };

        tracing::info!(run_id = %run_id, status = %status, "resuming scan");
        let run = match next {
            Resume::Poll(generation) => self.inner.check_then_poll(generation, run_id).await,
            Resume::Fetch(generation) => {
                self.inner.fetch_results(generation, &run_id).await;
                self.snapshot()
            }
            Resume::Restored => self.snapshot(),
        };
        Ok(Some(run))
    }

    /// Stop monitoring and forget the run. Safe to call when idle.
    pub fn stop(&self) -> Result<(), MonitorError> {
        let mut tracked = self.inner.tracked.lock();
        let previous = tracked.run.run_id.take();
        tracked.reset();
        self.inner.clear_run_keys()?;
        if let Some(run_id) = previous {
            tracing::info!(run_id = %run_id, "stopped monitoring scan");
        }
        Ok(())
    }
}

impl Inner {
    async fn check_then_poll(self: &Arc<Self>, generation: u64, run_id: String) -> ScanRun {
        if let Check::KeepPolling = self.check(generation, &run_id).await {
            self.ensure_polling(generation, run_id);
        }
        self.tracked.lock().run.clone()
    }

    fn ensure_polling(self: &Arc<Self>, generation: u64, run_id: String) {
        let mut tracked = self.tracked.lock();
        if tracked.generation != generation || tracked.poller.is_active() {
            return;
        }

        let weak = Arc::downgrade(self);
        let period = self.config.poll_interval;
        tracked
            .poller
            .spawn(move |token| poll(weak, generation, run_id, period, token));
        tracked.run.polling = true;
    }

    /// One status check. Terminal answers stop the interval.
    async fn check(&self, generation: u64, run_id: &str) -> Check {
        {
            let mut tracked = self.tracked.lock();
            if tracked.generation != generation {
                return Check::Stale;
            }
            tracked.run.loading = true;
        }

        let answer = self.backend.scan_status(run_id).await;

        let outcome = {
            let mut tracked = self.tracked.lock();
            if tracked.generation != generation {
                tracing::debug!(run_id, "dropping status of a scan no longer monitored");
                return Check::Stale;
            }
            tracked.run.last_checked_at = Some(Utc::now());

            match answer {
                Ok(ScanStatus::Succeeded) => {
                    tracing::info!(run_id, "scan succeeded");
                    tracked.poller.cancel();
                    tracked.run.polling = false;
                    tracked.run.status = Some(ScanStatus::Succeeded);
                    tracked.run.status_message = Some(ScanStatus::Succeeded.message());
                    self.persist_or_warn(&tracked.run);
                    Check::Succeeded
                }
                Ok(ScanStatus::Failed) => {
                    tracing::warn!(run_id, "scan failed");
                    tracked.poller.cancel();
                    tracked.generation += 1;
                    tracked.run.polling = false;
                    tracked.run.loading = false;
                    tracked.run.run_id = None;
                    tracked.run.status = Some(ScanStatus::Failed);
                    tracked.run.status_message = Some(ScanStatus::Failed.message());
                    // the failure stays visible in memory, the store forgets the run
                    if let Err(e) = self.clear_run_keys() {
                        tracing::warn!("failed to clear scan state: {}", e);
                    }
                    Check::Finished
                }
                Ok(status) => {
                    tracing::debug!(run_id, status = %status, "scan still running");
                    tracked.run.loading = false;
                    tracked.run.status_message = Some(status.message());
                    tracked.run.status = Some(status);
                    self.persist_or_warn(&tracked.run);
                    Check::KeepPolling
                }
                Err(e) => {
                    tracing::warn!(run_id, "scan status check failed: {}", e);
                    tracked.run.loading = false;
                    tracked.run.status_message = Some(format!("Unable to check scan status: {}", e));
                    self.persist_or_warn(&tracked.run);
                    Check::KeepPolling
                }
            }
        };

        match outcome {
            Check::Succeeded => {
                self.fetch_results(generation, run_id).await;
                Check::Finished
            }
            other => other,
        }
    }

    /// Fetch the results of a succeeded run, at most once per run
    async fn fetch_results(&self, generation: u64, run_id: &str) {
        {
            let mut tracked = self.tracked.lock();
            if tracked.generation != generation || tracked.results_fetched {
                return;
            }
            tracked.results_fetched = true;
            tracked.run.loading = true;
        }

        tokio::time::sleep(self.config.settle_delay).await;
        if self.tracked.lock().generation != generation {
            return;
        }

        let answer = self.backend.scan_results(run_id).await;

        let mut tracked = self.tracked.lock();
        if tracked.generation != generation {
            tracing::debug!(run_id, "dropping results of a scan no longer monitored");
            return;
        }
        tracked.run.loading = false;

        match answer {
            Ok(results) => {
                tracing::info!(run_id, files = results.len(), "scan results loaded");
                if results.is_empty() {
                    tracked.run.status_message =
                        Some("Scan completed successfully, no files found".to_string());
                }
                tracked.run.results = results;
                self.persist_or_warn(&tracked.run);
                let persisted = self
                    .store
                    .set_json(keys::SCAN_RESULTS, &tracked.run.results)
                    .and_then(|_| {
                        self.store
                            .set_json(keys::SEARCH_FOUND, &!tracked.run.results.is_empty())
                    });
                if let Err(e) = persisted {
                    tracing::warn!("failed to persist scan results: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(run_id, "failed to load scan results: {}", e);
                tracked.run.status_message =
                    Some(format!("Scan completed but results could not be loaded: {}", e));
                self.persist_or_warn(&tracked.run);
            }
        }
    }

    fn persist(&self, run: &ScanRun) -> Result<(), StoreError> {
        self.store
            .set_or_remove(keys::CURRENT_RUN_ID, run.run_id.as_deref())?;
        self.store.set_or_remove(
            keys::SCAN_STATUS,
            run.status.as_ref().map(ScanStatus::as_str),
        )?;
        self.store
            .set_or_remove(keys::SCAN_STATUS_MESSAGE, run.status_message.as_deref())
    }

    fn persist_or_warn(&self, run: &ScanRun) {
        if let Err(e) = self.persist(run) {
            tracing::warn!("failed to persist scan state: {}", e);
        }
    }

    fn clear_run_keys(&self) -> Result<(), StoreError> {
        for key in [
            keys::CURRENT_RUN_ID,
            keys::SCAN_STATUS,
            keys::SCAN_STATUS_MESSAGE,
        ] {
            self.store.remove(key)?;
        }
        Ok(())
    }
}

/// Interval-driven checks. The first tick is one full period out; the
///  immediate check has already happened by the time this is spawned.
async fn poll(
    monitor: Weak<Inner>,
    generation: u64,
    run_id: String,
    period: Duration,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!(run_id = %run_id, "scan polling cancelled");
                return;
            }
            _ = interval.tick() => {
                let Some(inner) = monitor.upgrade() else {
                    return;
                };
                match inner.check(generation, &run_id).await {
                    Check::KeepPolling => {}
                    Check::Succeeded | Check::Finished | Check::Stale => return,
                }
            }
        }
    }
}
