use std::sync::Arc;
use axum::extract::{Path, Query, State};
use axum::Json;
use axum_extra::response::ErasedJson;
use netsentinel_schemas::api_models::{HistoryList, ReportResponse};
use netsentinel_schemas::handlers::PrettyQueryParams;
use netsentinel_schemas::project::ProjectName;
use crate::{AppError, AppState};
use crate::history::HistoryError;

/// List all saved reports, newest first.
/// Requires a read lock on the history.
pub async fn list_history(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<PrettyQueryParams>,
) -> Result<ErasedJson, AppError> {
    let projects = app_state.history_db
        .read()
        .await
        .list_reports()
        .await?;
    let list = HistoryList { projects };

    // format json with pretty formatting if query parameter present and true
    if params.pretty.unwrap_or(false) {
        return Ok(ErasedJson::pretty(list));
    }
    Ok(ErasedJson::new(list))
}

/// Get one report. The name goes through the same sanitising as analysis so a report is always
/// found under the name it was created with.
/// Requires a read lock on the history.
pub async fn get_history_report(
    State(app_state): State<Arc<AppState>>,
    Path(project_name): Path<String>,
) -> Result<Json<ReportResponse>, AppError> {
    let project = ProjectName::sanitize(&project_name)
        .ok_or_else(|| HistoryError::NotFound(project_name.clone()))?;
    let report = app_state.history_db
        .read()
        .await
        .get_report(&project)
        .await?;
    Ok(Json(ReportResponse { report }))
}
