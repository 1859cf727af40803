//! Handle for a fire-and-forget envelope refresh.

use tapad_rtd_storage::StoredOutcome;
use tokio::task::JoinHandle;
use tracing::warn;

/// A spawned envelope fetch.
///
/// The bidding cycle never awaits this. Dropping the handle detaches the
/// task; it keeps running and writes the cache when the response arrives.
/// Tests and hosts that need to observe completion call [`wait`].
///
/// [`wait`]: BackgroundFetch::wait
#[derive(Debug)]
pub struct BackgroundFetch {
    handle: JoinHandle<Option<StoredOutcome>>,
}

impl BackgroundFetch {
    pub(crate) fn new(handle: JoinHandle<Option<StoredOutcome>>) -> Self {
        Self { handle }
    }

    /// Whether the fetch has completed, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Let the fetch run to completion unobserved.
    pub fn detach(self) {
        drop(self.handle);
    }

    /// Wait for the fetch to finish.
    ///
    /// Returns what was stored, or `None` when the fetch failed (the
    /// failure has already been logged) or the task was aborted.
    pub async fn wait(self) -> Option<StoredOutcome> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(reason = %e, "envelope fetch task did not complete");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_returns_task_outcome() {
        let handle = tokio::spawn(async { Some(StoredOutcome::NoTrack) });
        let fetch = BackgroundFetch::new(handle);
        assert_eq!(fetch.wait().await, Some(StoredOutcome::NoTrack));
    }

    #[tokio::test]
    async fn test_aborted_task_yields_none() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Some(StoredOutcome::NoTrack)
        });
        handle.abort();
        let fetch = BackgroundFetch::new(handle);
        assert_eq!(fetch.wait().await, None);
    }

    #[tokio::test]
    async fn test_detached_task_still_runs() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            let _ = tx.send(());
            None
        });
        BackgroundFetch::new(handle).detach();
        assert!(rx.await.is_ok());
    }
}
