//! Factory Dashboard Service (DashSrv)
//!
//! Serves the factory-monitoring pages over HTTP: each page is backed by a
//! view model that owns its fetched cache, kept fresh by the live
//! subscription bridge, with the alert/downtime mutations as the only
//! write paths.

pub mod api;
pub mod config;
pub mod error;
pub mod live;
pub mod views;

use pulse_store::PulseStore;
use std::sync::Arc;

pub use config::DashConfig;
pub use error::{DashError, Result};

use views::{AlertsView, DashboardView, DetailRegistry, DowntimeView, MachinesView};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: PulseStore,
    pub dashboard: Arc<DashboardView>,
    pub machines: Arc<MachinesView>,
    pub alerts: Arc<AlertsView>,
    pub downtime: Arc<DowntimeView>,
    pub details: Arc<DetailRegistry>,
}

impl AppState {
    /// Build the page views over the store and start their watches
    pub async fn new(store: PulseStore) -> Self {
        Self {
            dashboard: DashboardView::spawn(store.clone()).await,
            machines: MachinesView::spawn(store.clone()).await,
            alerts: AlertsView::spawn(store.clone()).await,
            downtime: DowntimeView::spawn(store.clone()).await,
            details: DetailRegistry::spawn(store.clone()),
            store,
        }
    }
}
