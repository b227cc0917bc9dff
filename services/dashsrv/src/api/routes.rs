//! Route table for the dashboard API.

use crate::api::handlers;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Pages
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        .route("/api/v1/machines", get(handlers::list_machines))
        .route("/api/v1/machines/{id}", get(handlers::get_machine_detail))
        .route("/api/v1/downtime", get(handlers::list_downtime))
        .route("/api/v1/alerts", get(handlers::list_alerts))
        .route("/api/v1/settings", get(handlers::get_settings))
        // Mutations
        .route(
            "/api/v1/alerts/{id}/acknowledge",
            post(handlers::acknowledge_alert),
        )
        .route("/api/v1/alerts/{id}/resolve", post(handlers::resolve_alert))
        .route(
            "/api/v1/downtime/{id}/close",
            post(handlers::close_downtime),
        )
        // Reports
        .route("/api/v1/reports", get(handlers::list_reports))
        .route(
            "/api/v1/reports/daily-production",
            get(handlers::report_daily_production),
        )
        .route(
            "/api/v1/reports/downtime-analysis",
            get(handlers::report_downtime_analysis),
        )
        .route(
            "/api/v1/reports/alert-summary",
            get(handlers::report_alert_summary),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
