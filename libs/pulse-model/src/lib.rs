//! FactoryPulse domain model
//!
//! Entities mirrored from the factory store schema plus the pure
//! derived-metric functions the dashboard views compute over them.
//!
//! # Key Components
//!
//! - Entity types: machines, alerts, downtime, state samples, reference data
//! - Closed enums for every status/severity/role domain
//! - **metrics**: status tally, OEE proxy, downtime aggregates, filters

pub mod metrics;
pub mod types;

pub use metrics::{
    format_oee, oee, AlertCounts, AlertFilter, DowntimeFilter, DowntimeSummary, MachineFilter,
    StatusTally,
};
pub use types::{
    Alert, AlertSeverity, AlertStatus, Department, Downtime, DowntimeStatus, Machine,
    MachineState, MachineStatus, ProductionLog, Profile, Shift, UserRole, UserRoleAssignment,
};
