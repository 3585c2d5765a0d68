mod handlers;

use std::sync::Arc;
use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;
use netsentinel_schemas::settings::Settings;
use crate::AppState;
use crate::config::assets_dir;
use crate::gui::handlers::gui_home;

pub fn add_gui_handlers(settings: &Settings) -> Router<Arc<AppState>> {
    let scripts = assets_dir(&settings.server).join("scripts");
    Router::new()
        .route("/", get(gui_home))
        .nest_service("/assets/scripts", ServeDir::new(scripts))
}
