use std::path::Path;
use std::sync::Arc;
use axum::{Json, Router};
use axum::routing::{get, post};
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use tera::Tera;
use tokio::sync::RwLock;
use netsentinel_schemas::api_models::ErrorResponse;
use netsentinel_schemas::settings::Settings;
use crate::analysis::handlers::analyze;
use crate::capture::{CaptureError, CaptureRunner};
use crate::gui::add_gui_handlers;
use crate::history::{HistoryError, HistoryProvider};
use crate::history::handlers::{get_history_report, list_history};
use crate::report::ReportGenerator;

pub mod analysis;
pub mod capture;
pub mod config;
pub mod gui;
pub mod history;
pub mod logging;
pub mod report;

/// Store a version of the server when compiled - shown on the page footer
pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Store some state for the handlers. Everything in here is built once at startup, the capture
/// runner and report generator are trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub history_db: Arc<RwLock<Box<dyn HistoryProvider + Sync + Send>>>,
    pub capture_runner: Arc<dyn CaptureRunner + Sync + Send>,
    pub report_generator: Arc<dyn ReportGenerator + Sync + Send>,
    pub template_env: Arc<RwLock<Tera>>,
    pub server_url: String,
}

/// Errors returned by the handlers. Every variant is rendered as `{"error": "<message>"}` with a
/// status code picked by `status_code`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Nome do projeto nao fornecido.")]
    MissingProjectName,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("{0}")]
    Template(#[from] tera::Error),
    #[error("{0:#}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Other(err)
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingProjectName => StatusCode::BAD_REQUEST,
            AppError::History(HistoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        } else {
            tracing::debug!("request rejected with {status}: {self}");
        }
        (
            status,
            Json(ErrorResponse { error: self.to_string() }),
        )
            .into_response()
    }
}

/// Produce the app in a separate function to allow for testing without creating an http server.
pub fn netsentinel_app(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/:project_name", get(get_history_report))
        .route("/analyze", post(analyze))
        .merge(add_gui_handlers(&app_state.settings))
        .with_state(app_state)
}

/// Load every html template under `<assets>/templates`
pub fn get_tera_env(assets_dir: &Path) -> anyhow::Result<Arc<RwLock<Tera>>> {
    let glob = format!("{}/templates/**/*.html", assets_dir.display());
    let tera = Tera::new(&glob)?;
    Ok(Arc::new(RwLock::new(tera)))
}

pub async fn debug_reload_templates(
    app_state: &Arc<AppState>,
) -> anyhow::Result<()> {
    if cfg!(debug_assertions) {
        app_state.template_env.write().await.full_reload()?;
    }
    Ok(())
}
