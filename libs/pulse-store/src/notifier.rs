//! Change-notification transport.
//!
//! One logical channel per table. Views subscribe for the lifetime of the
//! view; dropping the returned [`ChangeFeed`] releases the subscription on
//! every exit path, so a subscribe is always paired with a release.
//!
//! Implementations:
//! - `BroadcastNotifier`: in-process tokio broadcast, for tests and
//!   single-process deployments
//! - `RedisNotifier`: Redis pub/sub for multi-process deployments

use crate::error::{Result, StoreError};
use crate::events::{ChangeEvent, Table};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// Buffered events per subscriber before lag is reported
const FEED_CAPACITY: usize = 64;

/// Table-scoped change publish/subscribe
#[async_trait]
pub trait ChangeNotifier: Send + Sync + 'static {
    /// Publish one change event to the table's channel
    async fn publish(&self, event: &ChangeEvent) -> Result<()>;

    /// Open a subscription to a table's change events
    async fn subscribe(&self, table: Table) -> Result<ChangeFeed>;
}

/// Event stream of one subscription.
///
/// Dropping the feed closes the channel and ends the backing task, which
/// releases the underlying subscription.
pub struct ChangeFeed {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl ChangeFeed {
    pub(crate) fn new(rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Next event in publish order; `None` once the source is gone
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

/// In-process notifier backed by per-table broadcast channels
#[derive(Default)]
pub struct BroadcastNotifier {
    channels: DashMap<Table, broadcast::Sender<ChangeEvent>>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, table: Table) -> broadcast::Sender<ChangeEvent> {
        self.channels
            .entry(table)
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl ChangeNotifier for BroadcastNotifier {
    async fn publish(&self, event: &ChangeEvent) -> Result<()> {
        // A send error only means no live subscribers
        let _ = self.sender(event.table).send(*event);
        Ok(())
    }

    async fn subscribe(&self, table: Table) -> Result<ChangeFeed> {
        let mut source = self.sender(table).subscribe();
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            // Feed dropped: subscription released
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("change feed for {} lagged, missed {} events", table, missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(ChangeFeed::new(rx))
    }
}

/// Redis pub/sub notifier; one channel per table (`pulse:changes:<table>`)
#[cfg(feature = "redis-backend")]
pub struct RedisNotifier {
    client: redis::Client,
    conn: redis::aio::ConnectionManager,
}

#[cfg(feature = "redis-backend")]
impl RedisNotifier {
    /// Connect to Redis and prepare the publishing connection
    pub async fn connect(url: &str) -> Result<Self> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Notify(e.to_string()))?;
        let conn = redis::aio::ConnectionManager::new(client.clone())
            .await
            .map_err(|e| StoreError::Notify(e.to_string()))?;
        Ok(Self { client, conn })
    }
}

#[cfg(feature = "redis-backend")]
#[async_trait]
impl ChangeNotifier for RedisNotifier {
    async fn publish(&self, event: &ChangeEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.conn.clone();
        let _receivers: u32 = redis::cmd("PUBLISH")
            .arg(event.table.channel())
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Notify(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, table: Table) -> Result<ChangeFeed> {
        use futures::StreamExt;

        let client = self.client.clone();
        let channel = table.channel();
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);

        tokio::spawn(async move {
            loop {
                match client.get_async_pubsub().await {
                    Ok(mut pubsub) => {
                        if let Err(e) = pubsub.subscribe(&channel).await {
                            tracing::error!("failed to subscribe to {}: {}", channel, e);
                        } else {
                            let mut stream = pubsub.into_on_message();
                            while let Some(msg) = stream.next().await {
                                let Ok(payload) = msg.get_payload::<String>() else {
                                    continue;
                                };
                                match serde_json::from_str::<ChangeEvent>(&payload) {
                                    Ok(event) => {
                                        if tx.send(event).await.is_err() {
                                            // Feed dropped: unsubscribe by exit
                                            return;
                                        }
                                    }
                                    Err(e) => {
                                        warn!("bad change payload on {}: {}", channel, e)
                                    }
                                }
                            }
                            // Stream ended: connection lost, resubscribe
                        }
                    }
                    Err(e) => {
                        tracing::error!("redis connection failed: {}", e);
                    }
                }
                if tx.is_closed() {
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        });

        Ok(ChangeFeed::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeOp;
    use uuid::Uuid;

    fn event(table: Table) -> ChangeEvent {
        ChangeEvent {
            table,
            op: ChangeOp::Update,
            row_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber_in_order() {
        let notifier = BroadcastNotifier::new();
        let mut feed = notifier.subscribe(Table::Machines).await.unwrap();

        let first = event(Table::Machines);
        let second = event(Table::Machines);
        notifier.publish(&first).await.unwrap();
        notifier.publish(&second).await.unwrap();

        assert_eq!(feed.next().await, Some(first));
        assert_eq!(feed.next().await, Some(second));
    }

    #[tokio::test]
    async fn test_tables_are_isolated_channels() {
        let notifier = BroadcastNotifier::new();
        let mut machines = notifier.subscribe(Table::Machines).await.unwrap();
        let mut alerts = notifier.subscribe(Table::Alerts).await.unwrap();

        let alert_event = event(Table::Alerts);
        notifier.publish(&alert_event).await.unwrap();

        assert_eq!(alerts.next().await, Some(alert_event));
        // Machines feed saw nothing
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(50), machines.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let notifier = BroadcastNotifier::new();
        notifier.publish(&event(Table::Downtime)).await.unwrap();
    }

    #[tokio::test]
    async fn test_dropping_feed_releases_subscription() {
        let notifier = BroadcastNotifier::new();
        let feed = notifier.subscribe(Table::Alerts).await.unwrap();
        drop(feed);

        // Give the forwarding task a chance to observe the closed feed
        tokio::task::yield_now().await;
        notifier.publish(&event(Table::Alerts)).await.unwrap();
    }
}
