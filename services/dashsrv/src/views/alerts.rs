//! Alerts page view: full alert list with per-status counts.

use crate::live::{self, FetchSeq, LiveHandle, WatchScope};
use pulse_model::{Alert, AlertCounts, AlertFilter};
use pulse_store::{AlertQuery, PulseStore, Table};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Rendered alerts page
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertsData {
    /// Counts over the full set, not the filtered slice
    pub counts: AlertCounts,
    pub alerts: Vec<Alert>,
}

pub struct AlertsView {
    store: PulseStore,
    alerts: RwLock<Vec<Alert>>,
    seq: FetchSeq,
    _watch: OnceLock<LiveHandle>,
}

impl AlertsView {
    pub async fn spawn(store: PulseStore) -> Arc<Self> {
        let view = Arc::new(Self {
            store: store.clone(),
            alerts: RwLock::new(Vec::new()),
            seq: FetchSeq::new(),
            _watch: OnceLock::new(),
        });
        view.refresh().await;

        let weak = Arc::downgrade(&view);
        let handle = live::watch(
            store.notifier(),
            WatchScope::table(Table::Alerts),
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
        match self.store.list_alerts(&AlertQuery::default()).await {
            Ok(alerts) => {
                if self.seq.is_current(token) {
                    *self.alerts.write().await = alerts;
                } else {
                    debug!("discarding stale alert list fetch");
                }
            }
            Err(e) => warn!("alert list refetch failed, keeping last data: {}", e),
        }
    }

    /// Counts over everything, list filtered per request; order preserved
    pub async fn snapshot(&self, filter: &AlertFilter) -> AlertsData {
        let alerts = self.alerts.read().await;
        AlertsData {
            counts: AlertCounts::of(&alerts),
            alerts: alerts.iter().filter(|a| filter.matches(a)).cloned().collect(),
        }
    }
}
