//! Shared fixtures: in-memory store and raw row seeding.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use pulse_store::{db, BroadcastNotifier, PulseStore};
use std::sync::Arc;
use uuid::Uuid;

pub fn ts(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn fmt(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub async fn test_store() -> PulseStore {
    let pool = db::connect_memory().await.expect("in-memory pool");
    db::apply_schema(&pool).await.expect("schema");
    PulseStore::new(pool, Arc::new(BroadcastNotifier::new()))
}

pub async fn seed_department(store: &PulseStore, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO departments (id, name, description, created_at) VALUES (?, ?, NULL, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(fmt(Utc::now()))
        .execute(store.pool())
        .await
        .expect("seed department");
    id
}

pub async fn seed_machine(
    store: &PulseStore,
    name: &str,
    model: Option<&str>,
    status: &str,
    department: Option<Uuid>,
    is_active: bool,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = fmt(Utc::now());
    sqlx::query(
        r#"
        INSERT INTO machines (id, name, model, status, department_id, is_active,
                              created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(name)
    .bind(model)
    .bind(status)
    .bind(department.map(|d| d.to_string()))
    .bind(is_active as i64)
    .bind(&now)
    .bind(&now)
    .execute(store.pool())
    .await
    .expect("seed machine");
    id
}

pub async fn seed_profile(store: &PulseStore, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = fmt(Utc::now());
    sqlx::query(
        "INSERT INTO profiles (id, email, full_name, created_at, updated_at) \
         VALUES (?, ?, NULL, ?, ?)",
    )
    .bind(id.to_string())
    .bind(email)
    .bind(&now)
    .bind(&now)
    .execute(store.pool())
    .await
    .expect("seed profile");
    id
}

pub async fn seed_user_role(store: &PulseStore, user: Uuid, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO user_roles (id, user_id, role, created_at) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(user.to_string())
        .bind(role)
        .bind(fmt(Utc::now()))
        .execute(store.pool())
        .await
        .expect("seed user role");
    id
}

pub async fn seed_alert_at(
    store: &PulseStore,
    machine: Uuid,
    severity: &str,
    status: &str,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO alerts (id, machine_id, message, severity, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(machine.to_string())
    .bind(format!("{} alert on {}", severity, machine))
    .bind(severity)
    .bind(status)
    .bind(fmt(created_at))
    .execute(store.pool())
    .await
    .expect("seed alert");
    id
}

pub async fn seed_alert(store: &PulseStore, machine: Uuid, severity: &str, status: &str) -> Uuid {
    seed_alert_at(store, machine, severity, status, Utc::now()).await
}

pub async fn seed_downtime(
    store: &PulseStore,
    machine: Uuid,
    start_time: DateTime<Utc>,
    reason: Option<&str>,
    closed_after_minutes: Option<i64>,
) -> Uuid {
    let id = Uuid::new_v4();
    let (status, end_time, duration) = match closed_after_minutes {
        Some(minutes) => (
            "closed",
            Some(fmt(start_time + chrono::Duration::minutes(minutes))),
            Some(minutes),
        ),
        None => ("open", None, None),
    };
    sqlx::query(
        r#"
        INSERT INTO downtime (id, machine_id, start_time, end_time, duration_minutes,
                              reason, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(machine.to_string())
    .bind(fmt(start_time))
    .bind(end_time)
    .bind(duration)
    .bind(reason)
    .bind(status)
    .bind(fmt(start_time))
    .execute(store.pool())
    .await
    .expect("seed downtime");
    id
}

pub async fn seed_state(
    store: &PulseStore,
    machine: Uuid,
    timestamp: DateTime<Utc>,
    cycle_time: Option<f64>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO machine_states (id, machine_id, timestamp, status, cycle_time)
        VALUES (?, ?, ?, 'running', ?)
        "#,
    )
    .bind(id.to_string())
    .bind(machine.to_string())
    .bind(fmt(timestamp))
    .bind(cycle_time)
    .execute(store.pool())
    .await
    .expect("seed machine state");
    id
}

pub async fn seed_production_log(
    store: &PulseStore,
    machine: Uuid,
    log_date: NaiveDate,
    output: i64,
    good: i64,
    rejected: i64,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO production_logs (id, machine_id, log_date, output_count,
                                     good_parts, rejected_parts, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(machine.to_string())
    .bind(log_date.to_string())
    .bind(output)
    .bind(good)
    .bind(rejected)
    .bind(fmt(Utc::now()))
    .execute(store.pool())
    .await
    .expect("seed production log");
    id
}
