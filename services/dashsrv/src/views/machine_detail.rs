//! Machine detail view: one machine's row, recent alerts, recent downtime,
//! and the cycle-time trend window.
//!
//! Detail views are registry-managed: one per navigated machine, created
//! lazily, kept fresh by a row-scoped watch, and torn down when the machine
//! row is deleted.

use crate::error::Result;
use crate::live::{self, FetchSeq, LiveHandle, WatchScope};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pulse_model::{Alert, AlertStatus, Downtime, Machine};
use pulse_store::{AlertQuery, ChangeOp, DowntimeQuery, PulseStore, Table};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Recent-item window on the detail page
const RECENT_LIMIT: u32 = 5;
/// Cycle-time readings in the trend chart
const TREND_LIMIT: u32 = 30;

/// One cycle-time reading, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub time: DateTime<Utc>,
    pub cycle_time: f64,
}

/// Rendered machine detail page
#[derive(Debug, Clone, Serialize)]
pub struct MachineDetailData {
    pub machine: Machine,
    pub active_alert_count: usize,
    pub recent_alerts: Vec<Alert>,
    pub recent_downtime: Vec<Downtime>,
    pub cycle_trend: Vec<TrendPoint>,
}

pub struct MachineDetailView {
    store: PulseStore,
    machine_id: Uuid,
    data: RwLock<MachineDetailData>,
    seq: FetchSeq,
    _watch: OnceLock<LiveHandle>,
}

impl MachineDetailView {
    /// Build the view for one machine; `NotFound` when the row is missing
    pub async fn spawn(store: PulseStore, machine_id: Uuid) -> Result<Arc<Self>> {
        let initial = fetch_detail(&store, machine_id).await?;
        let view = Arc::new(Self {
            store: store.clone(),
            machine_id,
            data: RwLock::new(initial),
            seq: FetchSeq::new(),
            _watch: OnceLock::new(),
        });

        let weak = Arc::downgrade(&view);
        let handle = live::watch(
            store.notifier(),
            WatchScope::row(Table::Machines, machine_id),
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
        Ok(view)
    }

    pub async fn refresh(&self) {
        let token = self.seq.begin();
        match fetch_detail(&self.store, self.machine_id).await {
            Ok(data) => {
                if self.seq.is_current(token) {
                    *self.data.write().await = data;
                } else {
                    debug!("discarding stale detail fetch for {}", self.machine_id);
                }
            }
            Err(e) => warn!(
                "detail refetch for {} failed, keeping last data: {}",
                self.machine_id, e
            ),
        }
    }

    pub async fn snapshot(&self) -> MachineDetailData {
        self.data.read().await.clone()
    }
}

async fn fetch_detail(store: &PulseStore, machine_id: Uuid) -> Result<MachineDetailData> {
    let machine = store.get_machine(machine_id).await?;
    let recent_alerts = store
        .list_alerts(&AlertQuery::for_machine(machine_id).limit(RECENT_LIMIT))
        .await?;
    let recent_downtime = store
        .list_downtime(&DowntimeQuery::for_machine(machine_id).limit(RECENT_LIMIT))
        .await?;
    let states = store.recent_machine_states(machine_id, TREND_LIMIT).await?;

    let cycle_trend = states
        .iter()
        .map(|s| TrendPoint {
            time: s.timestamp,
            cycle_time: s.cycle_time.unwrap_or(0.0),
        })
        .collect();
    let active_alert_count = recent_alerts
        .iter()
        .filter(|a| a.status == AlertStatus::Active)
        .count();

    Ok(MachineDetailData {
        machine,
        active_alert_count,
        recent_alerts,
        recent_downtime,
        cycle_trend,
    })
}

/// Open detail views, one per machine id.
///
/// A watch on the machines table prunes the entry when its row is deleted;
/// dropping the entry drops the view's row-scoped watch with it.
pub struct DetailRegistry {
    store: PulseStore,
    views: DashMap<Uuid, Arc<MachineDetailView>>,
    _prune: OnceLock<LiveHandle>,
}

impl DetailRegistry {
    pub fn spawn(store: PulseStore) -> Arc<Self> {
        let registry = Arc::new(Self {
            store: store.clone(),
            views: DashMap::new(),
            _prune: OnceLock::new(),
        });

        let weak = Arc::downgrade(&registry);
        let handle = live::watch(
            store.notifier(),
            WatchScope::table(Table::Machines),
            move |event| {
                let weak = weak.clone();
                async move {
                    if event.op != ChangeOp::Delete {
                        return;
                    }
                    if let Some(registry) = weak.upgrade() {
                        if registry.views.remove(&event.row_id).is_some() {
                            info!("machine {} deleted, detail view closed", event.row_id);
                        }
                    }
                }
            },
        );
        let _ = registry._prune.set(handle);
        registry
    }

    /// Existing view for the machine, or a freshly spawned one
    pub async fn open(&self, machine_id: Uuid) -> Result<Arc<MachineDetailView>> {
        if let Some(view) = self.views.get(&machine_id) {
            return Ok(Arc::clone(view.value()));
        }
        let view = MachineDetailView::spawn(self.store.clone(), machine_id).await?;
        self.views.insert(machine_id, Arc::clone(&view));
        Ok(view)
    }

    /// Number of open detail views
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
