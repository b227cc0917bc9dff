//! Derived metrics over fetched collections.
//!
//! Pure, synchronous, total functions: status tallies, the OEE proxy,
//! downtime aggregates, and the filter predicates the list pages apply.

use crate::types::{
    Alert, AlertSeverity, AlertStatus, Downtime, DowntimeStatus, Machine, MachineStatus,
};
use serde::{Deserialize, Serialize};

/// Machine counts per status.
///
/// Invariant: `running + idle + down == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    pub total: usize,
    pub running: usize,
    pub idle: usize,
    pub down: usize,
}

impl StatusTally {
    /// Tally a machine collection by status
    pub fn of(machines: &[Machine]) -> Self {
        let mut tally = Self::default();
        for machine in machines {
            tally.total += 1;
            match machine.status {
                MachineStatus::Running => tally.running += 1,
                MachineStatus::Idle => tally.idle += 1,
                MachineStatus::Down => tally.down += 1,
            }
        }
        tally
    }
}

/// OEE proxy: fraction of machines currently running, as a percentage.
///
/// Defined as `0.0` for an empty collection.
pub fn oee(tally: &StatusTally) -> f64 {
    if tally.total == 0 {
        return 0.0;
    }
    tally.running as f64 / tally.total as f64 * 100.0
}

/// Render an OEE value to one decimal place ("75.0")
pub fn format_oee(value: f64) -> String {
    format!("{:.1}", value)
}

/// Downtime aggregates for the tracking page.
///
/// `total_minutes` sums the derived durations of closed incidents; ongoing
/// records (NULL duration) are excluded from the sum but counted as
/// incidents. No date filter is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeSummary {
    pub total_minutes: i64,
    pub open_incidents: usize,
    pub total_incidents: usize,
}

impl DowntimeSummary {
    /// Aggregate a downtime collection
    pub fn of(records: &[Downtime]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total_incidents += 1;
            if record.status == DowntimeStatus::Open {
                summary.open_incidents += 1;
            }
            if let Some(minutes) = record.duration_minutes {
                summary.total_minutes += minutes;
            }
        }
        summary
    }
}

/// Alert counts per lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub active: usize,
    pub acknowledged: usize,
    pub resolved: usize,
}

impl AlertCounts {
    /// Count an alert collection by status
    pub fn of(alerts: &[Alert]) -> Self {
        let mut counts = Self::default();
        for alert in alerts {
            match alert.status {
                AlertStatus::Active => counts.active += 1,
                AlertStatus::Acknowledged => counts.acknowledged += 1,
                AlertStatus::Resolved => counts.resolved += 1,
            }
        }
        counts
    }
}

/// Machine list filter: status equality and a case-insensitive substring
/// match against name or model. `None` fields are vacuously true.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachineFilter {
    pub status: Option<MachineStatus>,
    pub search: Option<String>,
}

impl MachineFilter {
    pub fn matches(&self, machine: &Machine) -> bool {
        if let Some(status) = self.status {
            if machine.status != status {
                return false;
            }
        }
        match self.search.as_deref() {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                machine.name.to_lowercase().contains(&term)
                    || machine
                        .model
                        .as_deref()
                        .is_some_and(|m| m.to_lowercase().contains(&term))
            }
        }
    }
}

/// Alert list filter: severity and status equality, conjunction
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AlertFilter {
    pub severity: Option<AlertSeverity>,
    pub status: Option<AlertStatus>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.severity.is_none_or(|s| alert.severity == s)
            && self.status.is_none_or(|s| alert.status == s)
    }
}

/// Downtime list filter: status equality
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DowntimeFilter {
    pub status: Option<DowntimeStatus>,
}

impl DowntimeFilter {
    pub fn matches(&self, record: &Downtime) -> bool {
        self.status.is_none_or(|s| record.status == s)
    }
}
