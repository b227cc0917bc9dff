//! Change event types for the notification feed.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Watched tables of the factory schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Machines,
    MachineStates,
    Alerts,
    Downtime,
    Departments,
    Shifts,
    Profiles,
    ProductionLogs,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Machines => "machines",
            Table::MachineStates => "machine_states",
            Table::Alerts => "alerts",
            Table::Downtime => "downtime",
            Table::Departments => "departments",
            Table::Shifts => "shifts",
            Table::Profiles => "profiles",
            Table::ProductionLogs => "production_logs",
        }
    }

    /// Pub/sub channel carrying this table's events
    pub fn channel(&self) -> String {
        format!("pulse:changes:{}", self.as_str())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// One row change on a watched table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
    pub row_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_naming() {
        assert_eq!(Table::Machines.channel(), "pulse:changes:machines");
        assert_eq!(
            Table::MachineStates.channel(),
            "pulse:changes:machine_states"
        );
    }

    #[test]
    fn test_event_json_round_trip() {
        let event = ChangeEvent {
            table: Table::Alerts,
            op: ChangeOp::Update,
            row_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"alerts\""));
        assert!(json.contains("\"update\""));
        let back: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
