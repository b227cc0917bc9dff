//! Dashboard view: fleet tally, OEE, status tiles, recent active alerts.

use crate::live::{self, FetchSeq, LiveHandle, WatchScope};
use pulse_model::{format_oee, oee, Alert, Machine, MachineStatus, StatusTally};
use pulse_store::{AlertQuery, MachineQuery, PulseStore, Table};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// How many active alerts the dashboard shows
const RECENT_ALERT_LIMIT: u32 = 5;

/// One cell of the status heat map
#[derive(Debug, Clone, Serialize)]
pub struct MachineTile {
    pub id: Uuid,
    pub name: String,
    pub status: MachineStatus,
}

impl From<&Machine> for MachineTile {
    fn from(machine: &Machine) -> Self {
        Self {
            id: machine.id,
            name: machine.name.clone(),
            status: machine.status,
        }
    }
}

/// Rendered dashboard state
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardData {
    pub tally: StatusTally,
    /// Running fraction of the fleet, one decimal place
    pub oee: String,
    pub machines: Vec<MachineTile>,
    pub active_alerts: Vec<Alert>,
}

/// Live dashboard cache; watches the machines and alerts tables
pub struct DashboardView {
    store: PulseStore,
    data: RwLock<DashboardData>,
    seq: FetchSeq,
    watches: OnceLock<Vec<LiveHandle>>,
}

impl DashboardView {
    pub async fn spawn(store: PulseStore) -> Arc<Self> {
        let view = Arc::new(Self {
            store: store.clone(),
            data: RwLock::new(DashboardData {
                oee: format_oee(0.0),
                ..Default::default()
            }),
            seq: FetchSeq::new(),
            watches: OnceLock::new(),
        });
        view.refresh().await;

        let mut handles = Vec::new();
        for table in [Table::Machines, Table::Alerts] {
            let weak = Arc::downgrade(&view);
            handles.push(live::watch(
                store.notifier(),
                WatchScope::table(table),
                move |_| {
                    let weak = weak.clone();
                    async move {
                        if let Some(view) = weak.upgrade() {
                            view.refresh().await;
                        }
                    }
                },
            ));
        }
        let _ = view.watches.set(handles);
        view
    }

    /// Refetch the dashboard's tables and recompute the derived metrics.
    ///
    /// Stale-but-visible on failure: the previous cache stays in place. A
    /// response that lost the race to a newer refetch is discarded.
    pub async fn refresh(&self) {
        let token = self.seq.begin();

        let machines = match self.store.list_machines(&MachineQuery::active()).await {
            Ok(machines) => machines,
            Err(e) => {
                warn!("dashboard machine refetch failed, keeping last data: {}", e);
                return;
            }
        };
        let active_alerts = match self
            .store
            .list_alerts(&AlertQuery::active().limit(RECENT_ALERT_LIMIT))
            .await
        {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!("dashboard alert refetch failed, keeping last data: {}", e);
                return;
            }
        };

        let tally = StatusTally::of(&machines);
        let data = DashboardData {
            oee: format_oee(oee(&tally)),
            tally,
            machines: machines.iter().map(MachineTile::from).collect(),
            active_alerts,
        };

        if self.seq.is_current(token) {
            *self.data.write().await = data;
        } else {
            debug!("discarding stale dashboard fetch");
        }
    }

    pub async fn snapshot(&self) -> DashboardData {
        self.data.read().await.clone()
    }
}
