pub mod handlers;
pub mod providers;

use async_trait::async_trait;
use netsentinel_schemas::project::ProjectName;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Relatorio nao encontrado.")]
    NotFound(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Pattern(#[from] glob::PatternError),
    #[error("{0}")]
    Glob(#[from] glob::GlobError),
}

/// The `HistoryProvider` is a trait to describe the store that backs the report history. The
/// server only depends on this trait, so the flat folder of Markdown files can be swapped for an
/// indexed store without touching the handlers. Implementations must be thread safe as they are
/// shared between all handler contexts.
#[async_trait]
pub trait HistoryProvider {
    /// Project names, most recently written report first
    async fn list_reports(&self) -> Result<Vec<String>, HistoryError>;
    async fn get_report(&self, project: &ProjectName) -> Result<String, HistoryError>;
    /// Replaces any earlier report with the same name
    async fn save_report(&self, project: &ProjectName, report: &str) -> Result<(), HistoryError>;
}
