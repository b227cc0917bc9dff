//! End-to-end API tests over an in-memory store and in-process change feed.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{SecondsFormat, Utc};
use dashsrv::{api, AppState};
use pulse_model::AlertFilter;
use pulse_store::{db, BroadcastNotifier, PulseStore};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

async fn seed_machine(store: &PulseStore, name: &str, model: Option<&str>, status: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO machines (id, name, model, status, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id.to_string())
    .bind(name)
    .bind(model)
    .bind(status)
    .bind(now())
    .bind(now())
    .execute(store.pool())
    .await
    .unwrap();
    id
}

async fn seed_profile(store: &PulseStore, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO profiles (id, email, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(email)
    .bind(now())
    .bind(now())
    .execute(store.pool())
    .await
    .unwrap();
    id
}

async fn seed_alert(store: &PulseStore, machine: Uuid, severity: &str, status: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO alerts (id, machine_id, message, severity, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(machine.to_string())
    .bind("test alert")
    .bind(severity)
    .bind(status)
    .bind(now())
    .execute(store.pool())
    .await
    .unwrap();
    id
}

struct TestApp {
    state: AppState,
    app: Router,
    store: PulseStore,
}

async fn test_app() -> TestApp {
    let pool = db::connect_memory().await.unwrap();
    db::apply_schema(&pool).await.unwrap();
    let store = PulseStore::new(pool, Arc::new(BroadcastNotifier::new()));
    let state = AppState::new(store.clone()).await;
    let app = api::router(state.clone());
    TestApp { state, app, store }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let harness = test_app().await;
    let (status, body) = get(&harness.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "dashsrv");
}

#[tokio::test]
async fn test_dashboard_tally_and_oee() {
    let harness = test_app().await;
    for name in ["Mill 1", "Mill 2", "Mill 3"] {
        seed_machine(&harness.store, name, None, "running").await;
    }
    let down = seed_machine(&harness.store, "Press 7", None, "down").await;
    seed_alert(&harness.store, down, "high", "active").await;

    // Seeding bypassed the store, so refresh the caches directly
    harness.state.dashboard.refresh().await;

    let (status, body) = get(&harness.app, "/api/v1/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tally"]["total"], 4);
    assert_eq!(body["tally"]["running"], 3);
    assert_eq!(body["tally"]["down"], 1);
    assert_eq!(body["oee"], "75.0");
    assert_eq!(body["machines"].as_array().unwrap().len(), 4);
    assert_eq!(body["active_alerts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_machine_list_filters() {
    let harness = test_app().await;
    seed_machine(&harness.store, "CNC Mill 3", Some("Haas VF-2"), "running").await;
    seed_machine(&harness.store, "Press 7", None, "down").await;
    harness.state.machines.refresh().await;

    let (status, body) = get(&harness.app, "/api/v1/machines").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get(&harness.app, "/api/v1/machines?status=down").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Press 7");

    let (_, body) = get(&harness.app, "/api/v1/machines?search=haas").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = get(&harness.app, "/api/v1/machines?status=all").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = get(&harness.app, "/api/v1/machines?status=paused").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_machine_detail_and_not_found() {
    let harness = test_app().await;
    let machine = seed_machine(&harness.store, "CNC Mill 3", None, "running").await;

    let (status, body) = get(&harness.app, &format!("/api/v1/machines/{}", machine)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["machine"]["name"], "CNC Mill 3");
    assert_eq!(body["cycle_trend"].as_array().unwrap().len(), 0);

    let (status, body) = get(&harness.app, &format!("/api/v1/machines/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_alert_lifecycle_over_http() {
    let harness = test_app().await;
    let machine = seed_machine(&harness.store, "CNC Mill 3", None, "running").await;
    let user = seed_profile(&harness.store, "op@factory.example").await;
    let alert = seed_alert(&harness.store, machine, "high", "active").await;
    harness.state.alerts.refresh().await;

    // Acknowledge the active alert
    let (status, body) = post_json(
        &harness.app,
        &format!("/api/v1/alerts/{}/acknowledge", alert),
        serde_json::json!({ "user_id": user }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "acknowledged");
    assert!(body["notice"].as_str().unwrap().contains("acknowledged"));

    // A second acknowledge moves backward and is rejected
    let (status, body) = post_json(
        &harness.app,
        &format!("/api/v1/alerts/{}/acknowledge", alert),
        serde_json::json!({ "user_id": user }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_TRANSITION");

    // Resolve, then resolve again (idempotent)
    let (status, body) =
        post_json(&harness.app, &format!("/api/v1/alerts/{}/resolve", alert), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");
    let (status, _) =
        post_json(&harness.app, &format!("/api/v1/alerts/{}/resolve", alert), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    // Unknown alert
    let (status, _) = post_json(
        &harness.app,
        &format!("/api/v1/alerts/{}/resolve", Uuid::new_v4()),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutation_refreshes_view_through_change_feed() {
    let harness = test_app().await;
    let machine = seed_machine(&harness.store, "CNC Mill 3", None, "running").await;
    let alert = seed_alert(&harness.store, machine, "high", "active").await;
    harness.state.alerts.refresh().await;

    let before = harness.state.alerts.snapshot(&AlertFilter::default()).await;
    assert_eq!(before.counts.active, 1);
    assert_eq!(before.counts.resolved, 0);

    // The handler does not patch the cache; the change feed does
    let (status, _) =
        post_json(&harness.app, &format!("/api/v1/alerts/{}/resolve", alert), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let after = harness.state.alerts.snapshot(&AlertFilter::default()).await;
        if after.counts.resolved == 1 && after.counts.active == 0 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "alerts view never refreshed from the change feed"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_reports_catalog_and_csv() {
    let harness = test_app().await;
    let (status, body) = get(&harness.app, "/api/v1/reports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/reports/daily-production?format=csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let (status, body) = get(&harness.app, "/api/v1/reports/alert-summary?from=nonsense").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_settings_page() {
    let harness = test_app().await;
    seed_profile(&harness.store, "admin@factory.example").await;

    let (status, body) = get(&harness.app, "/api/v1/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"].as_array().unwrap().len(), 4);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["users"][0]["roles"].as_array().unwrap().len(), 0);
}
