mod client;
mod diagnose;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing::level_filters::LevelFilter;
use netsentinel_schemas::cli_models::{HistoryCmd, Opts, SubCommand};
use reqwest::Client;
use crate::diagnose::diagnose;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    std::process::exit(match run_app().await {
        Ok(_) => 0,
        Err(err) => {
            tracing::error!("ERROR: {}", err);
            err.chain().skip(1).for_each(|cause| tracing::error!("because: {}", cause));
            1
        }
    });
}

fn log_level(s: &str) -> anyhow::Result<LevelFilter> {
    match s.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::ERROR),
        "warn" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        _ => Err(anyhow!("Unknown Log LevelFilter {}", s)),
    }
}

/// Parse the arguments, set up logging on stderr and run the sub command. Reports and lists go to
/// stdout so they can be piped into a file.
pub async fn run_app() -> anyhow::Result<()> {
    let opts: Opts = Opts::parse();
    let mut e = None;
    let level = match &opts.verbosity {
        None => LevelFilter::INFO,
        Some(x) => match log_level(x) {
            Ok(l) => l,
            Err(err) => {
                e = Some(err);
                LevelFilter::INFO
            }
        },
    };

    let stderr_log = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();
    if let Some(e) = e {
        tracing::warn!("{}", e);
    }

    parse_command(opts).await
}

/// This is the entrypoint for all commands
pub async fn parse_command(opts: Opts) -> anyhow::Result<()> {
    // diagnose talks to the remote API directly, no server needed
    if let SubCommand::Diagnose(cmd) = &opts.sub_command {
        return diagnose(cmd).await;
    }

    tracing::trace!("server connection = {:?}", opts.server_connection);
    let client = Client::new();
    let server_url = opts.server_connection.as_str();

    match &opts.sub_command {
        SubCommand::Analyze(cmd) => {
            let report = client::analyze(&client, server_url, &cmd.project_name)
                .await
                .with_context(|| format!("analyzing '{}'", cmd.project_name))?;
            println!("{report}");
        }
        SubCommand::History(HistoryCmd { project_name: None }) => {
            let projects = client::list_history(&client, server_url)
                .await
                .context("listing history")?;
            if projects.is_empty() {
                tracing::info!("no reports saved yet");
            }
            for project in projects {
                println!("{project}");
            }
        }
        SubCommand::History(HistoryCmd { project_name: Some(project_name) }) => {
            let report = client::get_report(&client, server_url, project_name)
                .await
                .with_context(|| format!("reading report '{project_name}'"))?;
            println!("{report}");
        }
        SubCommand::Diagnose(_) => {}
    }
    tracing::debug!("{} done", opts.sub_command.name());
    Ok(())
}
