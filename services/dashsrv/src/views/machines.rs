//! Machines page view: active fleet with department names.
//!
//! The cache holds the unfiltered list; status/search filters are applied
//! per request with the pure predicates, so filtering never refetches.

use crate::live::{self, FetchSeq, LiveHandle, WatchScope};
use pulse_model::{Machine, MachineFilter};
use pulse_store::{MachineQuery, PulseStore, Table};
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub struct MachinesView {
    store: PulseStore,
    machines: RwLock<Vec<Machine>>,
    seq: FetchSeq,
    _watch: OnceLock<LiveHandle>,
}

impl MachinesView {
    pub async fn spawn(store: PulseStore) -> Arc<Self> {
        let view = Arc::new(Self {
            store: store.clone(),
            machines: RwLock::new(Vec::new()),
            seq: FetchSeq::new(),
            _watch: OnceLock::new(),
        });
        view.refresh().await;

        let weak = Arc::downgrade(&view);
        let handle = live::watch(
            store.notifier(),
            WatchScope::table(Table::Machines),
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
        match self.store.list_machines(&MachineQuery::active()).await {
            Ok(machines) => {
                if self.seq.is_current(token) {
                    *self.machines.write().await = machines;
                } else {
                    debug!("discarding stale machine list fetch");
                }
            }
            Err(e) => warn!("machine list refetch failed, keeping last data: {}", e),
        }
    }

    /// Current list, filtered; order preserved
    pub async fn snapshot(&self, filter: &MachineFilter) -> Vec<Machine> {
        self.machines
            .read()
            .await
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect()
    }
}
