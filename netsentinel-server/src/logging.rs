use std::io::ErrorKind;
use anyhow::bail;
use tracing::level_filters;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_appender::non_blocking::WorkerGuard;
use netsentinel_schemas::settings::LoggingSettings;

/// Set up stdout logging, and a daily rolling `server.log` if a log folder is configured. The
/// returned guard flushes the file writer and has to be held until the server exits.
pub async fn configure_logging(
    settings: &LoggingSettings,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_thread_names(true);

    #[cfg(debug_assertions)]
    let log_level = level_filters::LevelFilter::DEBUG;
    #[cfg(not(debug_assertions))]
    let log_level = level_filters::LevelFilter::INFO;

    let Some(log_folder) = &settings.directory else {
        tracing_subscriber::registry()
            .with(stdout_log.with_filter(log_level))
            .init();
        return Ok(None);
    };

    match tokio::fs::create_dir_all(log_folder).await {
        Ok(_) => {}
        Err(err) => match err.kind() {
            ErrorKind::PermissionDenied => {
                bail!("permission denied creating log folder {}", log_folder.display());
            }
            _ => bail!("could not create log folder {}: {err:#}", log_folder.display()),
        },
    }

    let file_appender = tracing_appender::rolling::daily(log_folder, "server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(log_level);

    // set up logging for the layers and push logs into a file
    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(log_level)
                // Combine the filtered `stdout_log` layer with the
                // `file_log` layer, producing a new `Layered` layer.
                .and_then(file_log),
        )
        .init();
    Ok(Some(guard))
}
