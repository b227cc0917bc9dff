//! Machine state samples: append-only time series, read for trend charts.

use crate::db::{parse_ts, parse_uuid};
use crate::error::Result;
use crate::PulseStore;
use pulse_model::MachineState;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl PulseStore {
    /// The newest `limit` samples for a machine, returned oldest-first so
    /// the caller can chart them left to right.
    pub async fn recent_machine_states(
        &self,
        machine_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MachineState>> {
        let rows = sqlx::query(
            r#"
            SELECT id, machine_id, timestamp, status, cycle_time, utilization,
                   temperature, energy_consumption, output_count
            FROM machine_states
            WHERE machine_id = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(machine_id.to_string())
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await?;

        let mut samples = rows
            .into_iter()
            .map(hydrate_state)
            .collect::<Result<Vec<_>>>()?;
        samples.reverse();
        Ok(samples)
    }
}

fn hydrate_state(row: SqliteRow) -> Result<MachineState> {
    let id: String = row.try_get("id")?;
    let machine_id: String = row.try_get("machine_id")?;
    let timestamp: String = row.try_get("timestamp")?;
    let status: String = row.try_get("status")?;

    Ok(MachineState {
        id: parse_uuid(&id)?,
        machine_id: parse_uuid(&machine_id)?,
        timestamp: parse_ts(&timestamp)?,
        status: status.parse()?,
        cycle_time: row.try_get("cycle_time")?,
        utilization: row.try_get("utilization")?,
        temperature: row.try_get("temperature")?,
        energy_consumption: row.try_get("energy_consumption")?,
        output_count: row.try_get("output_count")?,
    })
}
