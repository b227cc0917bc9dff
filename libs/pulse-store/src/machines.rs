//! Machine readers: list with filters and department join, single-row get.

use crate::db::{parse_date, parse_ts, parse_uuid, parse_uuid_opt};
use crate::error::{Result, StoreError};
use crate::PulseStore;
use pulse_model::{Machine, MachineStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Machine list query: equality filters, name-ordered
#[derive(Debug, Clone, Default)]
pub struct MachineQuery {
    /// Restrict to machines participating in monitoring
    pub active_only: bool,
    /// Optional status equality filter (pushed to the store)
    pub status: Option<MachineStatus>,
}

impl MachineQuery {
    /// Active machines, any status
    pub fn active() -> Self {
        Self {
            active_only: true,
            status: None,
        }
    }
}

const MACHINE_COLUMNS: &str = r#"
    m.id, m.name, m.model, m.serial_number, m.status, m.criticality,
    m.ideal_cycle_time, m.last_maintenance_date, m.department_id,
    m.is_active, m.created_at, m.updated_at, d.name AS department_name
"#;

impl PulseStore {
    /// List machines with the department name resolved, ordered by name
    pub async fn list_machines(&self, query: &MachineQuery) -> Result<Vec<Machine>> {
        let mut sql = format!(
            "SELECT {MACHINE_COLUMNS} FROM machines m \
             LEFT JOIN departments d ON d.id = m.department_id WHERE 1 = 1"
        );
        if query.active_only {
            sql.push_str(" AND m.is_active = 1");
        }
        if query.status.is_some() {
            sql.push_str(" AND m.status = ?");
        }
        sql.push_str(" ORDER BY m.name ASC");

        let mut stmt = sqlx::query(&sql);
        if let Some(status) = query.status {
            stmt = stmt.bind(status.as_str());
        }

        let rows = stmt.fetch_all(self.pool()).await?;
        rows.into_iter().map(hydrate_machine).collect()
    }

    /// Fetch one machine with the department name resolved
    pub async fn get_machine(&self, id: Uuid) -> Result<Machine> {
        let sql = format!(
            "SELECT {MACHINE_COLUMNS} FROM machines m \
             LEFT JOIN departments d ON d.id = m.department_id WHERE m.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => hydrate_machine(row),
            None => Err(StoreError::not_found(format!("machine {}", id))),
        }
    }
}

pub(crate) fn hydrate_machine(row: SqliteRow) -> Result<Machine> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let last_maintenance_date: Option<String> = row.try_get("last_maintenance_date")?;
    let department_id: Option<String> = row.try_get("department_id")?;
    let is_active: i64 = row.try_get("is_active")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Machine {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        model: row.try_get("model")?,
        serial_number: row.try_get("serial_number")?,
        status: status.parse()?,
        criticality: row.try_get("criticality")?,
        ideal_cycle_time: row.try_get("ideal_cycle_time")?,
        last_maintenance_date: last_maintenance_date.as_deref().map(parse_date).transpose()?,
        department_id: parse_uuid_opt(department_id)?,
        department_name: row.try_get("department_name")?,
        is_active: is_active != 0,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
