//! Reference data readers: departments, shifts, profiles, role grants.
//!
//! Read-only from this layer's perspective; rows are managed elsewhere.

use crate::db::{parse_ts, parse_uuid};
use crate::error::Result;
use crate::PulseStore;
use pulse_model::{Department, Profile, Shift, UserRoleAssignment};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl PulseStore {
    /// Departments ordered by name
    pub async fn list_departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at FROM departments ORDER BY name ASC",
        )
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(hydrate_department).collect()
    }

    /// Shifts ordered by start time
    pub async fn list_shifts(&self) -> Result<Vec<Shift>> {
        let rows = sqlx::query(
            "SELECT id, name, start_time, end_time, planned_output, created_at \
             FROM shifts ORDER BY start_time ASC",
        )
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(hydrate_shift).collect()
    }

    /// User profiles ordered by email
    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let rows = sqlx::query(
            "SELECT id, email, full_name, created_at, updated_at \
             FROM profiles ORDER BY email ASC",
        )
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(hydrate_profile).collect()
    }

    /// Role grants, grouped per user by the caller
    pub async fn list_user_roles(&self) -> Result<Vec<UserRoleAssignment>> {
        let rows =
            sqlx::query("SELECT id, user_id, role, created_at FROM user_roles ORDER BY user_id")
                .fetch_all(self.pool())
                .await?;
        rows.into_iter().map(hydrate_user_role).collect()
    }
}

fn hydrate_department(row: SqliteRow) -> Result<Department> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Department {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: parse_ts(&created_at)?,
    })
}

fn hydrate_shift(row: SqliteRow) -> Result<Shift> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Shift {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        planned_output: row.try_get("planned_output")?,
        created_at: parse_ts(&created_at)?,
    })
}

fn hydrate_profile(row: SqliteRow) -> Result<Profile> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Profile {
        id: parse_uuid(&id)?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn hydrate_user_role(row: SqliteRow) -> Result<UserRoleAssignment> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let role: String = row.try_get("role")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(UserRoleAssignment {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        role: role.parse()?,
        created_at: parse_ts(&created_at)?,
    })
}
