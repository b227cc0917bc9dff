//! API handlers for the dashboard pages and mutations.
//!
//! Mutation handlers never patch view caches from their own result: the
//! change notification round-trip refreshes the views.

use crate::api::models::*;
use crate::error::{DashError, Result};
use crate::views::machine_detail::MachineDetailData;
use crate::views::{alerts::AlertsData, dashboard::DashboardData, downtime::DowntimeData};
use crate::views::{reports, settings};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use chrono::{NaiveDate, Utc};
use pulse_model::{AlertFilter, DowntimeFilter, Machine, MachineFilter};
use serde::Serialize;
use serde_json::json;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Parse an optional query value against a closed enum domain.
///
/// Absent values and the "all" sentinel mean "no filter".
fn parse_pick<T: FromStr>(value: Option<&str>, param: &str) -> Result<Option<T>> {
    match value {
        None | Some("all") | Some("") => Ok(None),
        Some(text) => text.parse::<T>().map(Some).map_err(|_| {
            DashError::invalid_parameter(param, format!("unknown value {:?}", text))
        }),
    }
}

fn parse_date(value: Option<&str>, param: &str) -> Result<NaiveDate> {
    match value {
        None => Ok(Utc::now().date_naive()),
        Some(text) => text.parse::<NaiveDate>().map_err(|_| {
            DashError::invalid_parameter(param, format!("expected YYYY-MM-DD, got {:?}", text))
        }),
    }
}

/// Report rows as JSON, or CSV when `format=csv` was asked for
fn report_response<T: Serialize>(rows: Vec<T>, format: Option<&str>) -> Result<Response> {
    match format {
        Some("csv") => {
            let body = reports::to_csv(&rows)?;
            Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
        }
        _ => Ok(Json(rows).into_response()),
    }
}

// === Health ===

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "dashsrv",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// === Pages ===

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardData> {
    Json(state.dashboard.snapshot().await)
}

pub async fn list_machines(
    State(state): State<AppState>,
    Query(query): Query<MachineListQuery>,
) -> Result<Json<Vec<Machine>>> {
    let filter = MachineFilter {
        status: parse_pick(query.status.as_deref(), "status")?,
        search: query.search,
    };
    Ok(Json(state.machines.snapshot(&filter).await))
}

pub async fn get_machine_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MachineDetailData>> {
    let view = state.details.open(id).await?;
    Ok(Json(view.snapshot().await))
}

pub async fn list_downtime(
    State(state): State<AppState>,
    Query(query): Query<DowntimeListQuery>,
) -> Result<Json<DowntimeData>> {
    let filter = DowntimeFilter {
        status: parse_pick(query.status.as_deref(), "status")?,
    };
    Ok(Json(state.downtime.snapshot(&filter).await))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> Result<Json<AlertsData>> {
    let filter = AlertFilter {
        severity: parse_pick(query.severity.as_deref(), "severity")?,
        status: parse_pick(query.status.as_deref(), "status")?,
    };
    Ok(Json(state.alerts.snapshot(&filter).await))
}

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<settings::SettingsData>> {
    Ok(Json(settings::settings(&state.store).await?))
}

// === Mutations ===

pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AcknowledgeRequest>,
) -> Result<Json<ActionResponse>> {
    let alert = state.store.acknowledge_alert(id, request.user_id).await?;
    info!("alert {} acknowledged by {}", id, request.user_id);
    Ok(Json(ActionResponse {
        id: alert.id,
        status: alert.status.to_string(),
        notice: "The alert has been acknowledged successfully.".to_string(),
    }))
}

pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>> {
    let alert = state.store.resolve_alert(id).await?;
    info!("alert {} resolved", id);
    Ok(Json(ActionResponse {
        id: alert.id,
        status: alert.status.to_string(),
        notice: "The alert has been resolved successfully.".to_string(),
    }))
}

pub async fn close_downtime(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CloseDowntimeRequest>,
) -> Result<Json<ActionResponse>> {
    let end_time = request.end_time.unwrap_or_else(Utc::now);
    let incident = state.store.close_downtime(id, end_time).await?;
    info!("downtime incident {} closed", id);
    Ok(Json(ActionResponse {
        id: incident.id,
        status: incident.status.to_string(),
        notice: "The downtime incident has been closed.".to_string(),
    }))
}

// === Reports ===

pub async fn list_reports() -> Json<Vec<reports::ReportCatalogEntry>> {
    Json(reports::catalog())
}

pub async fn report_daily_production(
    State(state): State<AppState>,
    Query(query): Query<DateReportQuery>,
) -> Result<Response> {
    let date = parse_date(query.date.as_deref(), "date")?;
    let rows = state.store.daily_production(date).await?;
    report_response(rows, query.format.as_deref())
}

pub async fn report_downtime_analysis(
    State(state): State<AppState>,
    Query(query): Query<RangeReportQuery>,
) -> Result<Response> {
    let from = parse_date(query.from.as_deref(), "from")?;
    let to = parse_date(query.to.as_deref(), "to")?;
    let rows = state.store.downtime_analysis(from, to).await?;
    report_response(rows, query.format.as_deref())
}

pub async fn report_alert_summary(
    State(state): State<AppState>,
    Query(query): Query<RangeReportQuery>,
) -> Result<Response> {
    let from = parse_date(query.from.as_deref(), "from")?;
    let to = parse_date(query.to.as_deref(), "to")?;
    let rows = state.store.alert_summary(from, to).await?;
    report_response(rows, query.format.as_deref())
}
