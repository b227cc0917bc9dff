//! Entity types mirrored from the factory store schema.
//!
//! Status and severity domains are closed enums with exhaustive matching;
//! the store spells them as lowercase strings, so every enum round-trips
//! through [`std::str::FromStr`] / `as_str`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Raised when a stored string does not belong to a closed enum domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {domain} value: {value}")]
pub struct UnknownValue {
    pub domain: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Store spelling of this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// All values in domain order
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownValue {
                        domain: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Operational status of a machine
    MachineStatus {
        Running => "running",
        Idle => "idle",
        Down => "down",
    }
}

text_enum! {
    /// Alert severity
    AlertSeverity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

text_enum! {
    /// Alert lifecycle status
    AlertStatus {
        Active => "active",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
    }
}

text_enum! {
    /// Downtime incident status
    DowntimeStatus {
        Open => "open",
        Closed => "closed",
    }
}

text_enum! {
    /// Application role
    UserRole {
        Admin => "admin",
        Manager => "manager",
        Maintenance => "maintenance",
        Operator => "operator",
    }
}

/// Factory machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Machine ID
    pub id: Uuid,
    /// Machine name
    pub name: String,
    /// Model designation
    pub model: Option<String>,
    /// Serial number
    pub serial_number: Option<String>,
    /// Operational status
    pub status: MachineStatus,
    /// Criticality label (free text in the store)
    pub criticality: Option<String>,
    /// Ideal cycle time in seconds
    pub ideal_cycle_time: Option<i64>,
    /// Date of last maintenance
    pub last_maintenance_date: Option<NaiveDate>,
    /// Owning department
    pub department_id: Option<Uuid>,
    /// Department name resolved via join
    pub department_name: Option<String>,
    /// Whether the machine participates in monitoring
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Update time
    pub updated_at: DateTime<Utc>,
}

/// Time-series sample of a machine's telemetry. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineState {
    pub id: Uuid,
    pub machine_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: MachineStatus,
    /// Observed cycle time in seconds
    pub cycle_time: Option<f64>,
    /// Utilization percentage
    pub utilization: Option<f64>,
    /// Temperature in degrees Celsius
    pub temperature: Option<f64>,
    /// Energy consumption in kWh
    pub energy_consumption: Option<f64>,
    /// Cumulative output count
    pub output_count: Option<i64>,
}

/// Alert raised against a machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID
    pub id: Uuid,
    /// Machine the alert belongs to
    pub machine_id: Uuid,
    /// Machine name resolved via join
    pub machine_name: Option<String>,
    /// Alert message
    pub message: String,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Alert status
    pub status: AlertStatus,
    /// Name of the rule that fired
    pub rule_triggered: Option<String>,
    /// Telemetry snapshot captured when the rule fired
    pub data_snapshot: Option<serde_json::Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Acknowledging user
    pub acknowledged_by: Option<Uuid>,
    /// Acknowledgment time
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Resolution time
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Whether the alert still needs attention
    pub fn is_open(&self) -> bool {
        matches!(self.status, AlertStatus::Active | AlertStatus::Acknowledged)
    }

    /// Acknowledge the alert.
    ///
    /// Only an `active` alert can be acknowledged; returns `false` without
    /// touching the record otherwise. Transitions never move backward.
    pub fn acknowledge(&mut self, user: Uuid, at: DateTime<Utc>) -> bool {
        if self.status != AlertStatus::Active {
            return false;
        }
        self.status = AlertStatus::Acknowledged;
        self.acknowledged_by = Some(user);
        self.acknowledged_at = Some(at);
        true
    }

    /// Resolve the alert.
    ///
    /// Permitted from `active` (skipping acknowledgment) and from
    /// `acknowledged`. Resolving an already-resolved alert is idempotent:
    /// the original `resolved_at` is kept.
    pub fn resolve(&mut self, at: DateTime<Utc>) {
        if self.status == AlertStatus::Resolved {
            return;
        }
        self.status = AlertStatus::Resolved;
        self.resolved_at = Some(at);
    }
}

/// Downtime incident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Downtime {
    /// Incident ID
    pub id: Uuid,
    /// Machine the incident belongs to
    pub machine_id: Uuid,
    /// Machine name resolved via join
    pub machine_name: Option<String>,
    /// Incident start
    pub start_time: DateTime<Utc>,
    /// Incident end; None while ongoing
    pub end_time: Option<DateTime<Utc>>,
    /// Derived once on close; None while ongoing
    pub duration_minutes: Option<i64>,
    /// Downtime reason
    pub reason: Option<String>,
    /// Incident status
    pub status: DowntimeStatus,
    /// Assigned user
    pub assigned_by: Option<Uuid>,
    /// Free-form comments
    pub comments: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Downtime {
    /// Whether the incident is still ongoing
    pub fn is_open(&self) -> bool {
        self.status == DowntimeStatus::Open
    }

    /// Close the incident, deriving its duration exactly once.
    ///
    /// Returns `false` without touching the record when already closed.
    pub fn close(&mut self, end_time: DateTime<Utc>) -> bool {
        if self.status == DowntimeStatus::Closed {
            return false;
        }
        self.status = DowntimeStatus::Closed;
        self.duration_minutes = Some((end_time - self.start_time).num_minutes());
        self.end_time = Some(end_time);
        true
    }
}

/// Department (production line grouping)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Shift definition with planned output target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub name: String,
    /// Shift start, "HH:MM" wall-clock time
    pub start_time: String,
    /// Shift end, "HH:MM" wall-clock time
    pub end_time: String,
    pub planned_output: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// User identity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role granted to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Per-shift production tally for one machine and date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLog {
    pub id: Uuid,
    pub machine_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub log_date: NaiveDate,
    pub output_count: i64,
    pub planned_output: Option<i64>,
    pub good_parts: Option<i64>,
    pub rejected_parts: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_alert(status: AlertStatus) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            machine_id: Uuid::new_v4(),
            machine_name: Some("CNC-01".to_string()),
            message: "Spindle temperature high".to_string(),
            severity: AlertSeverity::High,
            status,
            rule_triggered: None,
            data_snapshot: None,
            created_at: Utc::now(),
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in MachineStatus::ALL {
            assert_eq!(status.as_str().parse::<MachineStatus>().unwrap(), *status);
        }
        for severity in AlertSeverity::ALL {
            assert_eq!(severity.as_str().parse::<AlertSeverity>().unwrap(), *severity);
        }
        assert!("paused".parse::<MachineStatus>().is_err());
    }

    #[test]
    fn test_enum_serde_spelling() {
        let json = serde_json::to_string(&MachineStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let back: AlertSeverity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(back, AlertSeverity::Medium);
    }

    #[test]
    fn test_alert_acknowledge() {
        let mut alert = sample_alert(AlertStatus::Active);
        let user = Uuid::new_v4();

        assert!(alert.acknowledge(user, Utc::now()));
        assert_eq!(alert.status, AlertStatus::Acknowledged);
        assert_eq!(alert.acknowledged_by, Some(user));
        assert!(alert.acknowledged_at.is_some());
        assert!(alert.is_open());
    }

    #[test]
    fn test_alert_acknowledge_only_from_active() {
        let user = Uuid::new_v4();

        let mut acked = sample_alert(AlertStatus::Acknowledged);
        assert!(!acked.acknowledge(user, Utc::now()));
        assert_eq!(acked.status, AlertStatus::Acknowledged);

        let mut resolved = sample_alert(AlertStatus::Resolved);
        assert!(!resolved.acknowledge(user, Utc::now()));
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert!(resolved.acknowledged_by.is_none());
    }

    #[test]
    fn test_alert_resolve_skips_acknowledgment() {
        let mut alert = sample_alert(AlertStatus::Active);
        alert.resolve(Utc::now());

        assert_eq!(alert.status, AlertStatus::Resolved);
        assert!(alert.resolved_at.is_some());
        assert!(alert.acknowledged_at.is_none());
        assert!(!alert.is_open());
    }

    #[test]
    fn test_alert_resolve_is_idempotent() {
        let mut alert = sample_alert(AlertStatus::Active);
        let first = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();

        alert.resolve(first);
        alert.resolve(second);

        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.resolved_at, Some(first));
    }

    #[test]
    fn test_downtime_close_derives_duration_once() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let mut incident = Downtime {
            id: Uuid::new_v4(),
            machine_id: Uuid::new_v4(),
            machine_name: None,
            start_time: start,
            end_time: None,
            duration_minutes: None,
            reason: Some("Tool change".to_string()),
            status: DowntimeStatus::Open,
            assigned_by: None,
            comments: None,
            created_at: start,
        };
        assert!(incident.is_open());
        assert!(incident.duration_minutes.is_none());

        let end = Utc.with_ymd_and_hms(2025, 6, 1, 8, 45, 0).unwrap();
        assert!(incident.close(end));
        assert_eq!(incident.duration_minutes, Some(45));
        assert_eq!(incident.end_time, Some(end));

        // Closing again must not re-derive
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert!(!incident.close(later));
        assert_eq!(incident.duration_minutes, Some(45));
    }
}
