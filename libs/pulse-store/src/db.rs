//! SQLite pool setup and schema.
//!
//! Ids are UUID text, timestamps RFC3339 text (fixed microsecond precision
//! so lexicographic order is chronological), dates "YYYY-MM-DD" text.

use crate::error::{Result, StoreError};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Open the database file with settings tuned for edge deployment
pub async fn connect(db_path: impl AsRef<Path>) -> Result<SqlitePool> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::Database(format!("create {}: {}", parent.display(), e)))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .journal_mode(SqliteJournalMode::Wal) // concurrent readers
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    info!("SQLite database connected: {}", db_path.display());
    Ok(pool)
}

/// In-memory pool for tests and ephemeral runs
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

/// Create the factory schema if missing. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS machines (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            model TEXT,
            serial_number TEXT,
            status TEXT NOT NULL DEFAULT 'idle',
            criticality TEXT,
            ideal_cycle_time INTEGER,
            last_maintenance_date TEXT,
            department_id TEXT REFERENCES departments(id),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS machine_states (
            id TEXT PRIMARY KEY,
            machine_id TEXT NOT NULL REFERENCES machines(id),
            timestamp TEXT NOT NULL,
            status TEXT NOT NULL,
            cycle_time REAL,
            utilization REAL,
            temperature REAL,
            energy_consumption REAL,
            output_count INTEGER
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            full_name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS user_roles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES profiles(id),
            role TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            machine_id TEXT NOT NULL REFERENCES machines(id),
            message TEXT NOT NULL,
            severity TEXT NOT NULL DEFAULT 'low',
            status TEXT NOT NULL DEFAULT 'active',
            rule_triggered TEXT,
            data_snapshot TEXT,
            created_at TEXT NOT NULL,
            acknowledged_by TEXT REFERENCES profiles(id),
            acknowledged_at TEXT,
            resolved_at TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS downtime (
            id TEXT PRIMARY KEY,
            machine_id TEXT NOT NULL REFERENCES machines(id),
            start_time TEXT NOT NULL,
            end_time TEXT,
            duration_minutes INTEGER,
            reason TEXT,
            status TEXT NOT NULL DEFAULT 'open',
            assigned_by TEXT REFERENCES profiles(id),
            comments TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS shifts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            planned_output INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS production_logs (
            id TEXT PRIMARY KEY,
            machine_id TEXT NOT NULL REFERENCES machines(id),
            shift_id TEXT REFERENCES shifts(id),
            log_date TEXT NOT NULL,
            output_count INTEGER NOT NULL DEFAULT 0,
            planned_output INTEGER,
            good_parts INTEGER,
            rejected_parts INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_machine_states_machine_ts
             ON machine_states(machine_id, timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_alerts_machine ON alerts(machine_id)",
        "CREATE INDEX IF NOT EXISTS idx_downtime_machine ON downtime(machine_id)",
        "CREATE INDEX IF NOT EXISTS idx_production_logs_date ON production_logs(log_date)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// ==================== Column codecs ====================

/// Timestamp column encoding; fixed precision keeps TEXT order chronological
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("invalid timestamp {:?}: {}", text, e)))
}

pub fn parse_ts_opt(text: Option<String>) -> Result<Option<DateTime<Utc>>> {
    text.as_deref().map(parse_ts).transpose()
}

pub fn parse_date(text: &str) -> Result<NaiveDate> {
    text.parse::<NaiveDate>()
        .map_err(|e| StoreError::Serialization(format!("invalid date {:?}: {}", text, e)))
}

pub fn parse_uuid(text: &str) -> Result<Uuid> {
    Ok(Uuid::parse_str(text)?)
}

pub fn parse_uuid_opt(text: Option<String>) -> Result<Option<Uuid>> {
    text.as_deref().map(parse_uuid).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = connect_memory().await.unwrap();
        apply_schema(&pool).await.unwrap();
        apply_schema(&pool).await.unwrap();
    }

    #[test]
    fn test_timestamp_text_order_is_chronological() {
        use chrono::TimeZone;
        let earlier = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
            + chrono::Duration::microseconds(250);
        let later = earlier + chrono::Duration::milliseconds(3);
        assert!(fmt_ts(earlier) < fmt_ts(later));
        assert_eq!(parse_ts(&fmt_ts(earlier)).unwrap(), earlier);
    }
}
