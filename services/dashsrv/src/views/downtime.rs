//! Downtime page view: incident list with aggregate summary.

use crate::live::{self, FetchSeq, LiveHandle, WatchScope};
use pulse_model::{Downtime, DowntimeFilter, DowntimeSummary};
use pulse_store::{DowntimeQuery, PulseStore, Table};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Rendered downtime page
#[derive(Debug, Clone, Default, Serialize)]
pub struct DowntimeData {
    /// Aggregates over the full set, not the filtered slice
    pub summary: DowntimeSummary,
    pub records: Vec<Downtime>,
}

pub struct DowntimeView {
    store: PulseStore,
    records: RwLock<Vec<Downtime>>,
    seq: FetchSeq,
    _watch: OnceLock<LiveHandle>,
}

impl DowntimeView {
    pub async fn spawn(store: PulseStore) -> Arc<Self> {
        let view = Arc::new(Self {
            store: store.clone(),
            records: RwLock::new(Vec::new()),
            seq: FetchSeq::new(),
            _watch: OnceLock::new(),
        });
        view.refresh().await;

        let weak = Arc::downgrade(&view);
        let handle = live::watch(
            store.notifier(),
            WatchScope::table(Table::Downtime),
            move |_| {
                let weak = weak.clone();
                async move {
                    if let Some(view) = weak.upgrade() {
                        view.refresh().await;
                    }
                }
            },
        );
        let _ = view._watch.set(handle);
        view
    }

    pub async fn refresh(&self) {
        let token = self.seq.begin();
        match self.store.list_downtime(&DowntimeQuery::default()).await {
            Ok(records) => {
                if self.seq.is_current(token) {
                    *self.records.write().await = records;
                } else {
                    debug!("discarding stale downtime fetch");
                }
            }
            Err(e) => warn!("downtime refetch failed, keeping last data: {}", e),
        }
    }

    pub async fn snapshot(&self, filter: &DowntimeFilter) -> DowntimeData {
        let records = self.records.read().await;
        DowntimeData {
            summary: DowntimeSummary::of(&records),
            records: records.iter().filter(|r| filter.matches(r)).cloned().collect(),
        }
    }
}
