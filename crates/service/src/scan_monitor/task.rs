use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A spawned background task that can be cancelled cooperatively.
///
/// At most one task is held at a time: spawning again cancels the
///  previous one first. Dropping the holder cancels as well.
#[derive(Debug, Default)]
pub struct CancellableTask {
    token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl CancellableTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` with a fresh token it is expected to watch
    pub fn spawn<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        self.handle = Some(tokio::spawn(task(token.clone())));
        self.token = Some(token);
    }

    /// Signal the task to stop. Safe to call when nothing is running.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.handle = None;
    }

    pub fn is_active(&self) -> bool {
        match (&self.token, &self.handle) {
            (Some(token), Some(handle)) => !token.is_cancelled() && !handle.is_finished(),
            _ => false,
        }
    }
}

impl Drop for CancellableTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_loop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut task = CancellableTask::new();
        assert!(!task.is_active());

        let counter = ticks.clone();
        task.spawn(|token| async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });
        assert!(task.is_active());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        task.cancel();
        assert!(!task.is_active());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        // cancelling twice is fine
        task.cancel();
    }

    #[tokio::test]
    async fn test_respawn_cancels_previous() {
        let mut task = CancellableTask::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        task.spawn(|token| async move {
            token.cancelled().await;
            let _ = tx.send(());
        });
        task.spawn(|token| async move { token.cancelled().await });

        assert!(rx.await.is_ok());
        assert!(task.is_active());
    }
}
