pub mod handlers;

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;
use netsentinel_schemas::project::ProjectName;
use crate::{AppError, AppState};

/// Capture, generate, persist. The report is only written once generation has succeeded, so a
/// failed run never leaves a report behind. Concurrent runs are not coordinated, two runs for the
/// same project race on both files and the last one to finish wins.
pub async fn run_analysis(
    app_state: &Arc<AppState>,
    project: &ProjectName,
) -> Result<String, AppError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("analysis", %run_id, %project);

    async move {
        tracing::info!("starting analysis");
        let artifact = app_state.capture_runner.capture(project).await?;
        let capture_text = artifact.read_text().await?;

        tracing::info!("capture finished, starting report generation");
        let report = app_state.report_generator
            .generate(project, &capture_text)
            .await?;

        app_state.history_db
            .write()
            .await
            .save_report(project, &report)
            .await?;
        tracing::info!("analysis finished");
        Ok::<String, AppError>(report)
    }
        .instrument(span)
        .await
}
