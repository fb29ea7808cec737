// /api handlers: agent reports (token-guarded) and dashboard queries.

use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::AppState;
use super::error::{ApiError, ok};
use crate::models::{
    DEFAULT_PROJECT, HostMetricSnapshot, HostReport, HostSummary, ProjectEntry, normalize_project,
};
use crate::reporter::TOKEN_HEADER;
use crate::reshape::{DEFAULT_LIMIT_MINUTES, DEFAULT_OFFSET_MINUTES, QueryWindow, reshape};
use crate::units::now_millis;

type Params = Query<HashMap<String, String>>;

/// Rejects report requests whose `token` header does not match `server.token`.
pub(super) async fn require_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented != Some(state.config.server.token.as_str()) {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}

/// Missing or blank parameters are `None`; anything else must parse as an integer.
fn int_param(params: &HashMap<String, String>, name: &str) -> Result<Option<i64>, ApiError> {
    match params.get(name).map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{} must be an integer, got {:?}", name, raw))),
    }
}

fn required_id(params: &HashMap<String, String>) -> Result<i64, ApiError> {
    int_param(params, "id")?.ok_or_else(|| ApiError::BadRequest("id is required".into()))
}

/// POST /api/report_host
pub(super) async fn report_host(
    State(state): State<AppState>,
    body: Result<Json<HostReport>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(mut report) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    report.validate()?;
    state.repo.upsert_host(&report).await?;
    tracing::debug!(project = %report.project, hostname = %report.hostname, "host reported");
    Ok(ok(serde_json::Value::Null))
}

/// POST /api/report_host_metric
pub(super) async fn report_host_metric(
    State(state): State<AppState>,
    body: Result<Json<HostMetricSnapshot>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(mut snapshot) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    snapshot.validate()?;
    let id = state.repo.insert_metric(&snapshot).await?;
    tracing::debug!(project = %snapshot.project, hostname = %snapshot.hostname, id, "metric reported");
    Ok(ok(serde_json::Value::Null))
}

/// GET /api/get_projects
pub(super) async fn get_projects(State(state): State<AppState>) -> Result<Response, ApiError> {
    let projects: Vec<ProjectEntry> = state
        .repo
        .list_projects()
        .await?
        .into_iter()
        .map(ProjectEntry::new)
        .collect();
    Ok(ok(projects))
}

/// GET /api/get_hosts?project=
pub(super) async fn get_hosts(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Response, ApiError> {
    let project = match params.get("project").map(|s| s.trim()) {
        None | Some("") => DEFAULT_PROJECT.to_string(),
        Some(raw) => normalize_project(raw)?,
    };
    let hosts: Vec<HostSummary> = state
        .repo
        .list_hosts(&project)
        .await?
        .into_iter()
        .map(HostSummary::from)
        .collect();
    Ok(ok(hosts))
}

/// GET /api/get_host?id=
pub(super) async fn get_host(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Response, ApiError> {
    let id = required_id(&params)?;
    let host = state
        .repo
        .get_host(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("host {}", id)))?;
    Ok(ok(host))
}

/// GET /api/get_host_metric?id=&offset=&limit=
pub(super) async fn get_host_metric(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Response, ApiError> {
    let id = required_id(&params)?;
    let offset = int_param(&params, "offset")?.unwrap_or(DEFAULT_OFFSET_MINUTES);
    let limit = int_param(&params, "limit")?.unwrap_or(DEFAULT_LIMIT_MINUTES);

    let host = state
        .repo
        .get_host(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("host {}", id)))?;

    let window = QueryWindow::from_offset_limit(now_millis(), offset, limit).ok_or_else(|| {
        ApiError::BadRequest(format!("offset {} / limit {} out of range", offset, limit))
    })?;
    let rows = state
        .repo
        .get_metrics_in_window(&host.project, &host.code, window.begin, window.end)
        .await?;
    let series = reshape(&rows)?;
    tracing::debug!(id, rows = rows.len(), begin = window.begin, end = window.end, "host metric window");
    Ok(ok(series))
}
