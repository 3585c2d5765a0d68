use std::sync::Arc;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use tera::Context;
use crate::{AppError, AppState, debug_reload_templates, PROJECT_VERSION};

/// GUI index page, the only page. Everything else is done by the page's script against the JSON
/// endpoints.
pub async fn gui_home(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    // reload if running in debug mode to allow quick changing of templates during development
    debug_reload_templates(&app_state).await?;

    let tera = app_state.template_env.read().await;
    let mut tera_context = Context::new();

    add_base_tera_context(&mut tera_context, "NetSentinel", &app_state);
    tera_context.insert("capture_interface", &app_state.settings.capture.interface);
    tera_context.insert("capture_duration_secs", &app_state.settings.capture.duration_secs);
    tera_context.insert("model", &app_state.settings.generation.model);

    let render = tera.render("index.html", &tera_context)?;

    Ok(Html(render))
}

/// Helper to add base context variables for the Tera templating
fn add_base_tera_context(
    tera_context: &mut Context,
    page_name: &str,
    app_state: &Arc<AppState>,
) {
    tera_context.insert("project_version", PROJECT_VERSION);
    tera_context.insert("page_name", page_name);
    let server_url = app_state.server_url.replace("0.0.0.0", "localhost");
    tera_context.insert("server_url", &server_url);
}
