//! Report aggregates over production logs, downtime, and alerts.

use crate::error::Result;
use crate::PulseStore;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::Row;

/// One machine's production for a date
#[derive(Debug, Clone, Serialize)]
pub struct ProductionReportRow {
    pub machine: String,
    pub output_count: i64,
    pub planned_output: Option<i64>,
    pub good_parts: i64,
    pub rejected_parts: i64,
    /// good/output as a percentage; None when nothing was produced
    pub efficiency_pct: Option<f64>,
}

/// Downtime grouped by reason over a date range
#[derive(Debug, Clone, Serialize)]
pub struct DowntimeReasonRow {
    pub reason: String,
    pub incidents: i64,
    pub total_minutes: i64,
    pub longest_minutes: Option<i64>,
}

/// Alert totals per severity over a date range
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummaryRow {
    pub severity: String,
    pub total: i64,
    pub resolved: i64,
    /// Mean minutes from creation to acknowledgment, over acknowledged alerts
    pub mean_minutes_to_acknowledge: Option<f64>,
}

impl PulseStore {
    /// Per-machine production tallies for one date
    pub async fn daily_production(&self, date: NaiveDate) -> Result<Vec<ProductionReportRow>> {
        let rows = sqlx::query(
            r#"
            SELECT m.name AS machine,
                   SUM(p.output_count) AS output_count,
                   SUM(p.planned_output) AS planned_output,
                   SUM(COALESCE(p.good_parts, 0)) AS good_parts,
                   SUM(COALESCE(p.rejected_parts, 0)) AS rejected_parts
            FROM production_logs p
            JOIN machines m ON m.id = p.machine_id
            WHERE p.log_date = ?
            GROUP BY m.name
            ORDER BY m.name ASC
            "#,
        )
        .bind(date.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                let output_count: i64 = row.try_get("output_count")?;
                let good_parts: i64 = row.try_get("good_parts")?;
                let efficiency_pct = (output_count > 0)
                    .then(|| good_parts as f64 / output_count as f64 * 100.0);
                Ok(ProductionReportRow {
                    machine: row.try_get("machine")?,
                    output_count,
                    planned_output: row.try_get("planned_output")?,
                    good_parts,
                    rejected_parts: row.try_get("rejected_parts")?,
                    efficiency_pct,
                })
            })
            .collect()
    }

    /// Downtime grouped by reason, busiest reasons first
    pub async fn downtime_analysis(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DowntimeReasonRow>> {
        let rows = sqlx::query(
            r#"
            SELECT COALESCE(reason, 'Not specified') AS reason,
                   COUNT(*) AS incidents,
                   SUM(COALESCE(duration_minutes, 0)) AS total_minutes,
                   MAX(duration_minutes) AS longest_minutes
            FROM downtime
            WHERE substr(start_time, 1, 10) BETWEEN ? AND ?
            GROUP BY COALESCE(reason, 'Not specified')
            ORDER BY total_minutes DESC, reason ASC
            "#,
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DowntimeReasonRow {
                    reason: row.try_get("reason")?,
                    incidents: row.try_get("incidents")?,
                    total_minutes: row.try_get("total_minutes")?,
                    longest_minutes: row.try_get("longest_minutes")?,
                })
            })
            .collect()
    }

    /// Alert totals per severity with mean time-to-acknowledge
    pub async fn alert_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AlertSummaryRow>> {
        let rows = sqlx::query(
            r#"
            SELECT severity,
                   COUNT(*) AS total,
                   SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END) AS resolved,
                   AVG(CASE WHEN acknowledged_at IS NOT NULL
                       THEN (julianday(acknowledged_at) - julianday(created_at)) * 1440.0
                       END) AS mean_minutes_to_acknowledge
            FROM alerts
            WHERE substr(created_at, 1, 10) BETWEEN ? AND ?
            GROUP BY severity
            ORDER BY CASE severity
                         WHEN 'high' THEN 0
                         WHEN 'medium' THEN 1
                         ELSE 2
                     END
            "#,
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AlertSummaryRow {
                    severity: row.try_get("severity")?,
                    total: row.try_get("total")?,
                    resolved: row.try_get("resolved")?,
                    mean_minutes_to_acknowledge: row.try_get("mean_minutes_to_acknowledge")?,
                })
            })
            .collect()
    }
}
