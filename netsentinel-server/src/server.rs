use std::net::SocketAddr;
use std::process::exit;
use std::sync::Arc;
use axum::ServiceExt;
use axum::extract::Request;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tower_layer::Layer;
use netsentinel_lib::{AppState, get_tera_env, logging, netsentinel_app};
use netsentinel_lib::capture::TcpdumpCapture;
use netsentinel_lib::capture::cleanup::setup_capture_cleanup;
use netsentinel_lib::config::{assets_dir, load_settings, ServerArgs};
use netsentinel_lib::history::providers::{FileBasedProvider, HistoryDatabaseProvider};
use netsentinel_lib::report::GeminiReportGenerator;
use netsentinel_schemas::API_KEY_ENV;

// an analysis request holds its connection open for the whole capture, a few worker threads keep
// the history endpoints responsive while captures are running
#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let settings = match load_settings(ServerArgs::parse()).await {
        Ok(ok) => ok,
        Err(err) => {
            eprintln!("could not load settings, error: {err:#}");
            exit(1);
        }
    };

    let _logging_guard = match logging::configure_logging(&settings.logging).await {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("could not configure logging, error: {err:#}");
            exit(1);
        }
    };

    tracing::debug!("effective settings:\n{settings}");
    if !settings.has_api_key() {
        tracing::warn!("{API_KEY_ENV} is not set, reports will fail until the server is restarted with a key");
    }
    if !settings.capture.use_sudo && !nix::unistd::geteuid().is_root() {
        tracing::warn!("not running as root and sudo is disabled, captures will most likely be empty");
    }

    // the folder is the index of all reports, make sure it exists before the first list
    if let Err(err) = tokio::fs::create_dir_all(&settings.history.directory).await {
        tracing::error!("could not create history folder {}: {err:#}", settings.history.directory.display());
        exit(1);
    }

    // set up cron job to sweep old capture files, a no-op unless a retention is configured
    if let Err(err) = setup_capture_cleanup(&settings.capture).await {
        tracing::error!("could not set up capture cleanup cron job with err: {err:#}");
        exit(1);
    }

    let template_env = match get_tera_env(&assets_dir(&settings.server)) {
        Ok(env) => env,
        Err(err) => {
            tracing::error!("could not load templates: {err:#}");
            exit(1);
        }
    };

    let addr: SocketAddr = match format!("{}:{}", settings.server.ip, settings.server.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!("invalid listen address {}:{}: {err:#}", settings.server.ip, settings.server.port);
            exit(1);
        }
    };
    let server_url = format!("http://{addr}");

    // setup provider for the history, the provider implements HistoryProvider so another store
    // can be dropped in here without changing the handlers
    let history_db = HistoryDatabaseProvider::FileDB(
        FileBasedProvider::new(settings.history.directory.clone())
    ).get_provider();

    // the app state contains any shared context for the handlers
    let app_state = Arc::new(AppState {
        history_db: Arc::new(RwLock::new(history_db)),
        capture_runner: Arc::new(TcpdumpCapture::new(settings.capture.clone())),
        report_generator: Arc::new(GeminiReportGenerator::new(&settings.generation)),
        template_env,
        server_url,
        settings: Arc::new(settings),
    });

    // add trim slash middleware
    let app = NormalizePathLayer::trim_trailing_slash()
        .layer(netsentinel_app(app_state).layer(TraceLayer::new_for_http()));

    tracing::info!("listening on {addr}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("could not bind {addr}: {err:#}");
            exit(1);
        }
    };
    if let Err(err) = axum::serve::serve(listener, ServiceExt::<Request>::into_make_service(app)).await {
        tracing::error!("server stopped with error: {err:#}");
        exit(1);
    }
}
