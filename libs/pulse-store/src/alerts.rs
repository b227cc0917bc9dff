//! Alert readers and lifecycle mutations.
//!
//! Transitions only move forward: active -> acknowledged -> resolved, with
//! active -> resolved permitted. Each mutation is one guarded single-row
//! UPDATE; the status guard in the WHERE clause makes the transition check
//! and the write atomic.

use crate::db::{fmt_ts, parse_ts, parse_ts_opt, parse_uuid, parse_uuid_opt};
use crate::error::{Result, StoreError};
use crate::events::{ChangeOp, Table};
use crate::PulseStore;
use chrono::Utc;
use pulse_model::{Alert, AlertStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Alert list query: equality filters, newest first, optional limit
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub machine_id: Option<Uuid>,
    pub status: Option<AlertStatus>,
    pub limit: Option<u32>,
}

impl AlertQuery {
    /// Active alerts only
    pub fn active() -> Self {
        Self {
            status: Some(AlertStatus::Active),
            ..Default::default()
        }
    }

    /// All alerts for one machine
    pub fn for_machine(machine_id: Uuid) -> Self {
        Self {
            machine_id: Some(machine_id),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

const ALERT_COLUMNS: &str = r#"
    a.id, a.machine_id, a.message, a.severity, a.status, a.rule_triggered,
    a.data_snapshot, a.created_at, a.acknowledged_by, a.acknowledged_at,
    a.resolved_at, m.name AS machine_name
"#;

impl PulseStore {
    /// List alerts with the machine name resolved, newest first
    pub async fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>> {
        let mut sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts a \
             LEFT JOIN machines m ON m.id = a.machine_id WHERE 1 = 1"
        );
        if query.machine_id.is_some() {
            sql.push_str(" AND a.machine_id = ?");
        }
        if query.status.is_some() {
            sql.push_str(" AND a.status = ?");
        }
        sql.push_str(" ORDER BY a.created_at DESC");
        if query.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut stmt = sqlx::query(&sql);
        if let Some(machine_id) = query.machine_id {
            stmt = stmt.bind(machine_id.to_string());
        }
        if let Some(status) = query.status {
            stmt = stmt.bind(status.as_str());
        }
        if let Some(limit) = query.limit {
            stmt = stmt.bind(limit as i64);
        }

        let rows = stmt.fetch_all(self.pool()).await?;
        rows.into_iter().map(hydrate_alert).collect()
    }

    /// Fetch one alert with the machine name resolved
    pub async fn get_alert(&self, id: Uuid) -> Result<Alert> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts a \
             LEFT JOIN machines m ON m.id = a.machine_id WHERE a.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => hydrate_alert(row),
            None => Err(StoreError::not_found(format!("alert {}", id))),
        }
    }

    /// Acknowledge an active alert: stamps the acknowledging user and time.
    ///
    /// Rejected with `InvalidTransition` unless the alert is `active`.
    pub async fn acknowledge_alert(&self, id: Uuid, user_id: Uuid) -> Result<Alert> {
        let result = sqlx::query(
            r#"
            UPDATE alerts
            SET status = 'acknowledged', acknowledged_by = ?, acknowledged_at = ?
            WHERE id = ? AND status = 'active'
            "#,
        )
        .bind(user_id.to_string())
        .bind(fmt_ts(Utc::now()))
        .bind(id.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_alert(id).await?;
            return Err(StoreError::InvalidTransition {
                from: current.status.as_str().to_string(),
                to: AlertStatus::Acknowledged.as_str().to_string(),
            });
        }

        self.publish_change(Table::Alerts, ChangeOp::Update, id).await;
        self.get_alert(id).await
    }

    /// Resolve an alert, skipping acknowledgment when still active.
    ///
    /// Resolving an already-resolved alert succeeds without changing the
    /// row (resolved is terminal; the original `resolved_at` is kept).
    pub async fn resolve_alert(&self, id: Uuid) -> Result<Alert> {
        let result = sqlx::query(
            r#"
            UPDATE alerts
            SET status = 'resolved', resolved_at = ?
            WHERE id = ? AND status IN ('active', 'acknowledged')
            "#,
        )
        .bind(fmt_ts(Utc::now()))
        .bind(id.to_string())
        .execute(self.pool())
        .await?;

        // rows_affected == 0 covers both "missing" and "already resolved";
        // get_alert distinguishes them
        let alert = self.get_alert(id).await?;
        if result.rows_affected() > 0 {
            self.publish_change(Table::Alerts, ChangeOp::Update, id).await;
        }
        Ok(alert)
    }
}

pub(crate) fn hydrate_alert(row: SqliteRow) -> Result<Alert> {
    let id: String = row.try_get("id")?;
    let machine_id: String = row.try_get("machine_id")?;
    let severity: String = row.try_get("severity")?;
    let status: String = row.try_get("status")?;
    let data_snapshot: Option<String> = row.try_get("data_snapshot")?;
    let created_at: String = row.try_get("created_at")?;
    let acknowledged_by: Option<String> = row.try_get("acknowledged_by")?;
    let acknowledged_at: Option<String> = row.try_get("acknowledged_at")?;
    let resolved_at: Option<String> = row.try_get("resolved_at")?;

    Ok(Alert {
        id: parse_uuid(&id)?,
        machine_id: parse_uuid(&machine_id)?,
        machine_name: row.try_get("machine_name")?,
        message: row.try_get("message")?,
        severity: severity.parse()?,
        status: status.parse()?,
        rule_triggered: row.try_get("rule_triggered")?,
        data_snapshot: data_snapshot
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        created_at: parse_ts(&created_at)?,
        acknowledged_by: parse_uuid_opt(acknowledged_by)?,
        acknowledged_at: parse_ts_opt(acknowledged_at)?,
        resolved_at: parse_ts_opt(resolved_at)?,
    })
}
