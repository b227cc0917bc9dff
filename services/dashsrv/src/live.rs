//! Live subscription bridge.
//!
//! Connects a view to the store's change feed: one watch task per
//! view/scope pair, spawned when the view is built and aborted when its
//! [`LiveHandle`] drops, so every subscription is released on every exit
//! path. The bridge also owns the fetch-sequencing tokens that keep a slow
//! response from overwriting newer state.

use pulse_store::{ChangeEvent, ChangeNotifier, Table};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

/// Monotonic fetch tokens for one view.
///
/// Every refetch calls [`begin`](Self::begin) before awaiting the store and
/// checks [`is_current`](Self::is_current) before committing the result; a
/// response that lost the race to a newer refetch is discarded.
#[derive(Debug, Default)]
pub struct FetchSeq {
    issued: AtomicU64,
}

impl FetchSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the token for a refetch that is about to start
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether no newer refetch has started since this token was issued
    pub fn is_current(&self, token: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == token
    }
}

/// Subscription scope: a whole table, or one row of it
#[derive(Debug, Clone, Copy)]
pub struct WatchScope {
    pub table: Table,
    pub row: Option<Uuid>,
}

impl WatchScope {
    pub fn table(table: Table) -> Self {
        Self { table, row: None }
    }

    pub fn row(table: Table, id: Uuid) -> Self {
        Self {
            table,
            row: Some(id),
        }
    }

    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        event.table == self.table && self.row.is_none_or(|id| event.row_id == id)
    }
}

/// Handle of one watch task; dropping it ends the watch and releases the
/// underlying subscription.
pub struct LiveHandle {
    task: JoinHandle<()>,
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a watch task: invoke the refetch callback on every event in scope.
///
/// Events of one table arrive in publish order; the refetch is awaited
/// inside the task, so a burst of events replays refetches sequentially
/// rather than concurrently.
pub fn watch<F, Fut>(notifier: Arc<dyn ChangeNotifier>, scope: WatchScope, refetch: F) -> LiveHandle
where
    F: Fn(ChangeEvent) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let task = tokio::spawn(async move {
        let mut feed = match notifier.subscribe(scope.table).await {
            Ok(feed) => feed,
            Err(e) => {
                error!("failed to open change feed for {}: {}", scope.table, e);
                return;
            }
        };
        while let Some(event) = feed.next().await {
            if scope.accepts(&event) {
                debug!("{} change for {}, refetching", event.table, event.row_id);
                refetch(event).await;
            }
        }
    });
    LiveHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_store::{BroadcastNotifier, ChangeOp};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn event(table: Table, row_id: Uuid) -> ChangeEvent {
        ChangeEvent {
            table,
            op: ChangeOp::Update,
            row_id,
        }
    }

    async fn wait_for_count(counter: &AtomicUsize, expected: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while counter.load(Ordering::SeqCst) < expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {} refetches, saw {}",
                expected,
                counter.load(Ordering::SeqCst)
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn test_fetch_seq_discards_older_responses() {
        let seq = FetchSeq::new();
        let older = seq.begin();
        let newer = seq.begin();

        // The older fetch finished after the newer one began: discard it
        assert!(!seq.is_current(older));
        assert!(seq.is_current(newer));

        let newest = seq.begin();
        assert!(!seq.is_current(newer));
        assert!(seq.is_current(newest));
    }

    #[tokio::test]
    async fn test_watch_refetches_on_table_events() {
        let notifier: Arc<dyn ChangeNotifier> = Arc::new(BroadcastNotifier::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let _handle = watch(Arc::clone(&notifier), WatchScope::table(Table::Alerts), {
            let counter = Arc::clone(&counter);
            move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        });
        // Let the watch task open its feed before publishing
        tokio::time::sleep(Duration::from_millis(20)).await;

        notifier.publish(&event(Table::Alerts, Uuid::new_v4())).await.unwrap();
        notifier.publish(&event(Table::Alerts, Uuid::new_v4())).await.unwrap();
        // Different table: out of scope
        notifier.publish(&event(Table::Machines, Uuid::new_v4())).await.unwrap();

        wait_for_count(&counter, 2).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_row_scope_filters_other_rows() {
        let notifier: Arc<dyn ChangeNotifier> = Arc::new(BroadcastNotifier::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let watched_row = Uuid::new_v4();

        let _handle = watch(
            Arc::clone(&notifier),
            WatchScope::row(Table::Machines, watched_row),
            {
                let counter = Arc::clone(&counter);
                move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            },
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        notifier.publish(&event(Table::Machines, Uuid::new_v4())).await.unwrap();
        notifier.publish(&event(Table::Machines, watched_row)).await.unwrap();

        wait_for_count(&counter, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_handle_ends_watch() {
        let notifier: Arc<dyn ChangeNotifier> = Arc::new(BroadcastNotifier::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = watch(Arc::clone(&notifier), WatchScope::table(Table::Downtime), {
            let counter = Arc::clone(&counter);
            move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        notifier.publish(&event(Table::Downtime, Uuid::new_v4())).await.unwrap();
        wait_for_count(&counter, 1).await;

        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;

        notifier.publish(&event(Table::Downtime, Uuid::new_v4())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
