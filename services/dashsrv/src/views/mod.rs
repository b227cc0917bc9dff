//! Per-page view models.
//!
//! Each view owns its fetched cache and is constructed with the store it
//! reads from; there is no ambient shared state. Table-scoped views stay
//! fresh through the live bridge; a failed refetch logs a warning and
//! leaves the previous cache visible.

pub mod alerts;
pub mod dashboard;
pub mod downtime;
pub mod machine_detail;
pub mod machines;
pub mod reports;
pub mod settings;

pub use alerts::AlertsView;
pub use dashboard::DashboardView;
pub use downtime::DowntimeView;
pub use machine_detail::{DetailRegistry, MachineDetailView};
pub use machines::MachinesView;
