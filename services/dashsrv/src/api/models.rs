//! Request and response models for the dashboard API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of the acknowledge action; the id comes from the session collaborator
#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub user_id: Uuid,
}

/// Body of the close-downtime action; end time defaults to now
#[derive(Debug, Default, Deserialize)]
pub struct CloseDowntimeRequest {
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Outcome of a user-triggered mutation, with the notice the UI shows
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub id: Uuid,
    pub status: String,
    pub notice: String,
}

/// Machines page query; "all" (or absence) means unfiltered
#[derive(Debug, Default, Deserialize)]
pub struct MachineListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Alerts page query; "all" (or absence) means unfiltered
#[derive(Debug, Default, Deserialize)]
pub struct AlertListQuery {
    pub severity: Option<String>,
    pub status: Option<String>,
}

/// Downtime page query; "all" (or absence) means unfiltered
#[derive(Debug, Default, Deserialize)]
pub struct DowntimeListQuery {
    pub status: Option<String>,
}

/// Single-date report query; date defaults to today
#[derive(Debug, Default, Deserialize)]
pub struct DateReportQuery {
    pub date: Option<String>,
    pub format: Option<String>,
}

/// Date-range report query; the range defaults to today
#[derive(Debug, Default, Deserialize)]
pub struct RangeReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub format: Option<String>,
}
