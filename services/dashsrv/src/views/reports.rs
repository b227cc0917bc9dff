//! Reports page: the report catalogue and CSV rendering.
//!
//! Report data itself comes from the store's aggregate queries; this module
//! names the available reports and turns rows into downloadable CSV.

use crate::error::{DashError, Result};
use serde::Serialize;

/// One entry of the report catalogue
#[derive(Debug, Clone, Serialize)]
pub struct ReportCatalogEntry {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// The reports the dashboard offers
pub fn catalog() -> Vec<ReportCatalogEntry> {
    vec![
        ReportCatalogEntry {
            key: "daily-production",
            title: "Daily Production Report",
            description: "Per-machine production tallies for one date: output, \
                          planned target, good and rejected parts.",
        },
        ReportCatalogEntry {
            key: "downtime-analysis",
            title: "Downtime Analysis Report",
            description: "Downtime grouped by reason over a date range with \
                          incident counts and total minutes.",
        },
        ReportCatalogEntry {
            key: "alert-summary",
            title: "Alert Summary Report",
            description: "Alert frequency and severity distribution with mean \
                          acknowledgment response time.",
        },
    ]
}

/// Render report rows as CSV with a header row
pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| DashError::Render(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DashError::Render(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DashError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_store::DowntimeReasonRow;

    #[test]
    fn test_catalog_keys_are_unique() {
        let entries = catalog();
        let mut keys: Vec<_> = entries.iter().map(|e| e.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), entries.len());
    }

    #[test]
    fn test_csv_rendering() {
        let rows = vec![
            DowntimeReasonRow {
                reason: "Jam".to_string(),
                incidents: 3,
                total_minutes: 80,
                longest_minutes: Some(50),
            },
            DowntimeReasonRow {
                reason: "Not specified".to_string(),
                incidents: 1,
                total_minutes: 10,
                longest_minutes: None,
            },
        ];
        let csv = to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "reason,incidents,total_minutes,longest_minutes"
        );
        assert_eq!(lines.next().unwrap(), "Jam,3,80,50");
        assert_eq!(lines.next().unwrap(), "Not specified,1,10,");
    }
}
