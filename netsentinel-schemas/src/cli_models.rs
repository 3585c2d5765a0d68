use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use crate::API_KEY_ENV;

#[derive(Parser)]
#[command(version = "1.0", about = "Operator CLI for the NetSentinel server")]
pub struct Opts {
    #[arg(short, long)]
    pub verbosity: Option<String>,
    #[command(subcommand)]
    pub sub_command: SubCommand,
    #[arg(
    long,
    default_value = "http://localhost:5000/",
    help = "Specify the URL to the NetSentinel server"
    )]
    pub server_connection: String,
}

#[derive(Subcommand, Debug, Deserialize, Serialize)]
pub enum SubCommand {
    #[command(about = "Capture traffic on the server and print the generated report")]
    Analyze(AnalyzeCmd),
    #[command(about = "List saved reports, or print one of them")]
    History(HistoryCmd),
    #[command(about = "Check the API key and list the models it can use")]
    Diagnose(DiagnoseCmd),
}

impl SubCommand {
    pub fn name(&self) -> String {
        match &self {
            SubCommand::Analyze(_) => "analyze".into(),
            SubCommand::History(_) => "history".into(),
            SubCommand::Diagnose(_) => "diagnose".into(),
        }
    }
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeCmd {
    /// Name for the capture and its report
    pub project_name: String,
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryCmd {
    /// Print this report instead of listing all of them
    pub project_name: Option<String>,
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DiagnoseCmd {
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    #[serde(skip)]
    pub api_key: Option<String>,
    #[arg(long, default_value = "https://generativelanguage.googleapis.com/v1beta")]
    pub api_base: String,
}
