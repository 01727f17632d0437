//! Delayed follow-up actions keyed by stored name.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Runs one delayed action per key. Scheduling a key again supersedes the
/// pending action; a cancelled action is dropped without running. Once an
/// action has started it runs to completion.
#[derive(Debug, Clone, Default)]
pub struct FollowUpScheduler {
    pending: Arc<DashMap<String, (u64, CancellationToken)>>,
    tracker: TaskTracker,
    next_id: Arc<AtomicU64>,
}

impl FollowUpScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&self, key: &str, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        if let Some((_, previous)) = self
            .pending
            .insert(key.to_string(), (id, token.clone()))
        {
            previous.cancel();
            debug!(key, "Superseded pending follow-up");
        }

        let pending = self.pending.clone();
        let key = key.to_string();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(key = %key, "Follow-up cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    action.await;
                }
            }
            pending.remove_if(&key, |_, (pending_id, _)| *pending_id == id);
        });
    }

    /// Cancel the pending action for `key`. Returns `false` if there was none.
    pub fn cancel(&self, key: &str) -> bool {
        match self.pending.remove(key) {
            Some((_, (_, token))) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Wait until every scheduled action has finished or been cancelled.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_runs_after_delay() {
        let scheduler = FollowUpScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule("a", Duration::from_millis(10), counter_action(&counter));
        assert!(scheduler.is_pending("a"));

        scheduler.wait_idle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending("a"));
    }

    #[tokio::test]
    async fn test_cancel_drops_action() {
        let scheduler = FollowUpScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule("a", Duration::from_secs(60), counter_action(&counter));
        assert!(scheduler.cancel("a"));
        assert!(!scheduler.cancel("a"));

        scheduler.wait_idle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reschedule_supersedes() {
        let scheduler = FollowUpScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule("a", Duration::from_secs(60), counter_action(&counter));
        scheduler.schedule("a", Duration::from_millis(10), counter_action(&counter));
        assert_eq!(scheduler.pending_count(), 1);

        scheduler.wait_idle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }
}
