//! FactoryPulse data layer
//!
//! SQLite persistence for the factory schema plus row-change notifications,
//! behind one store handle.
//!
//! # Key Components
//!
//! - **PulseStore**: pooled SQLite access with typed per-entity readers and
//!   single-row mutations; mutations publish a change event on commit
//! - **ChangeNotifier trait**: table-scoped publish/subscribe for change
//!   events, with broadcast (in-process) and Redis pub/sub backends
//! - **ChangeFeed**: per-subscriber event stream; dropping it releases the
//!   subscription

pub mod alerts;
pub mod db;
pub mod downtime;
pub mod error;
pub mod events;
pub mod machines;
pub mod notifier;
pub mod reference;
pub mod reports;
pub mod states;

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

pub use error::{Result, StoreError};
pub use events::{ChangeEvent, ChangeOp, Table};
pub use notifier::{BroadcastNotifier, ChangeFeed, ChangeNotifier};

#[cfg(feature = "redis-backend")]
pub use notifier::RedisNotifier;

pub use alerts::AlertQuery;
pub use downtime::DowntimeQuery;
pub use machines::MachineQuery;
pub use reports::{AlertSummaryRow, DowntimeReasonRow, ProductionReportRow};

/// Store handle: SQLite pool plus the change-notification channel.
///
/// Cloning is cheap; all clones share the pool and notifier.
#[derive(Clone)]
pub struct PulseStore {
    pool: SqlitePool,
    notifier: Arc<dyn ChangeNotifier>,
}

impl PulseStore {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { pool, notifier }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn notifier(&self) -> Arc<dyn ChangeNotifier> {
        Arc::clone(&self.notifier)
    }

    /// Publish a change event after a committed mutation.
    ///
    /// Delivery is best-effort: a failed publish is logged and never fails
    /// the mutation itself.
    pub(crate) async fn publish_change(&self, table: Table, op: ChangeOp, row_id: Uuid) {
        let event = ChangeEvent { table, op, row_id };
        if let Err(e) = self.notifier.publish(&event).await {
            warn!("failed to publish {} change for {}: {}", table, row_id, e);
        }
    }
}
