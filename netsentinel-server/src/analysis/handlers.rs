use std::sync::Arc;
use axum::extract::State;
use axum::Json;
use netsentinel_schemas::api_models::{AnalyzeRequest, ReportResponse};
use netsentinel_schemas::project::ProjectName;
use crate::{AppError, AppState};
use crate::analysis::run_analysis;

/// Run a capture and return the generated report. This holds the request open for the whole
/// capture plus the model round trip.
/// A body that is not JSON, or has no usable project name, is answered with 400 before anything
/// touches the filesystem.
pub async fn analyze(
    State(app_state): State<Arc<AppState>>,
    body: Option<Json<AnalyzeRequest>>,
) -> Result<Json<ReportResponse>, AppError> {
    let raw_name = body
        .and_then(|Json(request)| request.project_name)
        .unwrap_or_default();
    let project = ProjectName::sanitize(&raw_name)
        .ok_or(AppError::MissingProjectName)?;

    let report = run_analysis(&app_state, &project).await?;
    Ok(Json(ReportResponse { report }))
}
