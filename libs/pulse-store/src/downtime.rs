//! Downtime readers and the close mutation.
//!
//! `duration_minutes` stays NULL while an incident is ongoing and is
//! derived exactly once when it closes.

use crate::db::{fmt_ts, parse_ts, parse_ts_opt, parse_uuid, parse_uuid_opt};
use crate::error::{Result, StoreError};
use crate::events::{ChangeOp, Table};
use crate::PulseStore;
use chrono::{DateTime, Utc};
use pulse_model::{Downtime, DowntimeStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Downtime list query: equality filters, newest start first, optional limit
#[derive(Debug, Clone, Default)]
pub struct DowntimeQuery {
    pub machine_id: Option<Uuid>,
    pub status: Option<DowntimeStatus>,
    pub limit: Option<u32>,
}

impl DowntimeQuery {
    /// All incidents for one machine
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

const DOWNTIME_COLUMNS: &str = r#"
    dt.id, dt.machine_id, dt.start_time, dt.end_time, dt.duration_minutes,
    dt.reason, dt.status, dt.assigned_by, dt.comments, dt.created_at,
    m.name AS machine_name
"#;

impl PulseStore {
    /// List downtime incidents with the machine name resolved, newest first
    pub async fn list_downtime(&self, query: &DowntimeQuery) -> Result<Vec<Downtime>> {
        let mut sql = format!(
            "SELECT {DOWNTIME_COLUMNS} FROM downtime dt \
             LEFT JOIN machines m ON m.id = dt.machine_id WHERE 1 = 1"
        );
        if query.machine_id.is_some() {
            sql.push_str(" AND dt.machine_id = ?");
        }
        if query.status.is_some() {
            sql.push_str(" AND dt.status = ?");
        }
        sql.push_str(" ORDER BY dt.start_time DESC");
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
        rows.into_iter().map(hydrate_downtime).collect()
    }

    /// Fetch one incident with the machine name resolved
    pub async fn get_downtime(&self, id: Uuid) -> Result<Downtime> {
        let sql = format!(
            "SELECT {DOWNTIME_COLUMNS} FROM downtime dt \
             LEFT JOIN machines m ON m.id = dt.machine_id WHERE dt.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => hydrate_downtime(row),
            None => Err(StoreError::not_found(format!("downtime {}", id))),
        }
    }

    /// Close an open incident, deriving its duration from the stored start.
    ///
    /// Closing an already-closed incident is `InvalidTransition`.
    pub async fn close_downtime(&self, id: Uuid, end_time: DateTime<Utc>) -> Result<Downtime> {
        let incident = self.get_downtime(id).await?;
        let duration_minutes = (end_time - incident.start_time).num_minutes();

        let result = sqlx::query(
            r#"
            UPDATE downtime
            SET status = 'closed', end_time = ?, duration_minutes = ?
            WHERE id = ? AND status = 'open'
            "#,
        )
        .bind(fmt_ts(end_time))
        .bind(duration_minutes)
        .bind(id.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InvalidTransition {
                from: DowntimeStatus::Closed.as_str().to_string(),
                to: DowntimeStatus::Closed.as_str().to_string(),
            });
        }

        self.publish_change(Table::Downtime, ChangeOp::Update, id).await;
        self.get_downtime(id).await
    }
}

pub(crate) fn hydrate_downtime(row: SqliteRow) -> Result<Downtime> {
    let id: String = row.try_get("id")?;
    let machine_id: String = row.try_get("machine_id")?;
    let start_time: String = row.try_get("start_time")?;
    let end_time: Option<String> = row.try_get("end_time")?;
    let status: String = row.try_get("status")?;
    let assigned_by: Option<String> = row.try_get("assigned_by")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Downtime {
        id: parse_uuid(&id)?,
        machine_id: parse_uuid(&machine_id)?,
        machine_name: row.try_get("machine_name")?,
        start_time: parse_ts(&start_time)?,
        end_time: parse_ts_opt(end_time)?,
        duration_minutes: row.try_get("duration_minutes")?,
        reason: row.try_get("reason")?,
        status: status.parse()?,
        assigned_by: parse_uuid_opt(assigned_by)?,
        comments: row.try_get("comments")?,
        created_at: parse_ts(&created_at)?,
    })
}
