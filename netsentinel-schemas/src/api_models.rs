use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`. The name is optional here so that a missing field can be answered
/// with the same 400 as an empty one.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub project_name: Option<String>,
}

/// A single report, returned by both `POST /analyze` and `GET /history/:project_name`
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReportResponse {
    pub report: String,
}

/// Project names in the history, most recently modified first
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryList {
    pub projects: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
