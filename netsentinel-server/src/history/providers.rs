use std::cmp::Reverse;
use std::io::ErrorKind;
use std::path::PathBuf;
use async_trait::async_trait;
use netsentinel_schemas::project::ProjectName;
use crate::history::{HistoryError, HistoryProvider};

/// This enum wraps the `HistoryProvider` implementations to be called in the server
/// initialisation.
#[derive(Clone)]
pub enum HistoryDatabaseProvider {
    FileDB(FileBasedProvider),
}

impl HistoryDatabaseProvider {
    /// Return the history store boxed with sync and send so that it can be shared by the handlers
    pub fn get_provider(self) -> Box<dyn HistoryProvider + Sync + Send> {
        match self {
            HistoryDatabaseProvider::FileDB(db) => {
                tracing::info!("using the file based provider for report history in {}", db.data_location.display());
                Box::new(db)
            }
        }
    }
}

/// The file based provider keeps one `<project>.md` per report in a single folder. The folder
/// contents are the index, every list re-reads the folder and stats each file. This is fine for
/// the handful of reports a single user accumulates.
#[derive(Clone)]
pub struct FileBasedProvider {
    pub data_location: PathBuf,
}

impl FileBasedProvider {
    pub fn new(data_location: PathBuf) -> Self {
        Self { data_location }
    }

    fn report_path(&self, project: &ProjectName) -> PathBuf {
        self.data_location.join(project.report_file_name())
    }
}

#[async_trait]
impl HistoryProvider for FileBasedProvider {
    async fn list_reports(&self) -> Result<Vec<String>, HistoryError> {
        let folder = glob::Pattern::escape(&self.data_location.display().to_string());
        let pattern = format!("{folder}/*.md");

        let mut reports = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            let metadata = tokio::fs::metadata(&path).await?;
            if !metadata.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::info!("skipping report file with a non utf-8 name: {}", path.display());
                continue;
            };
            reports.push((metadata.modified()?, stem.to_string()));
        }
        // newest first, equal timestamps fall back to the name so the order is stable
        reports.sort_by(|a, b| (Reverse(a.0), &a.1).cmp(&(Reverse(b.0), &b.1)));
        Ok(reports.into_iter().map(|(_, name)| name).collect())
    }

    async fn get_report(&self, project: &ProjectName) -> Result<String, HistoryError> {
        let path = self.report_path(project);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(HistoryError::NotFound(project.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save_report(&self, project: &ProjectName, report: &str) -> Result<(), HistoryError> {
        tokio::fs::create_dir_all(&self.data_location).await?;
        let path = self.report_path(project);
        tokio::fs::write(&path, report).await?;
        tracing::info!("saved report for {project} to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn name(raw: &str) -> ProjectName {
        ProjectName::sanitize(raw).unwrap()
    }

    fn touch(path: &std::path::Path, when: SystemTime) -> anyhow::Result<()> {
        std::fs::File::options().write(true).open(path)?.set_modified(when)?;
        Ok(())
    }

    fn ago(secs: u64) -> SystemTime {
        SystemTime::now() - Duration::from_secs(secs)
    }

    #[tokio::test]
    async fn test_list_orders_by_mtime_descending() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let db = FileBasedProvider::new(dir.path().to_path_buf());
        for (project, age) in [("oldest", 300), ("newest", 10), ("middle", 100)] {
            db.save_report(&name(project), "# report").await?;
            touch(&dir.path().join(format!("{project}.md")), ago(age))?;
        }
        assert_eq!(db.list_reports().await?, vec!["newest", "middle", "oldest"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_ignores_other_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("lab.md"), "# lab")?;
        std::fs::write(dir.path().join("lab.txt"), "raw capture")?;
        std::fs::write(dir.path().join("notes.markdown"), "x")?;
        std::fs::create_dir(dir.path().join("folder.md"))?;
        let db = FileBasedProvider::new(dir.path().to_path_buf());
        assert_eq!(db.list_reports().await?, vec!["lab"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_ties_are_stable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let db = FileBasedProvider::new(dir.path().to_path_buf());
        // one timestamp for all three so only the name can order them
        let when = ago(60);
        for project in ["b", "a", "c"] {
            db.save_report(&name(project), "same").await?;
            touch(&dir.path().join(format!("{project}.md")), when)?;
        }
        let first = db.list_reports().await?;
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(db.list_reports().await?, first);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_empty_folder() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let db = FileBasedProvider::new(dir.path().to_path_buf());
        assert!(db.list_reports().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_report_is_not_found() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let db = FileBasedProvider::new(dir.path().to_path_buf());
        let err = db.get_report(&name("ghost")).await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(_)));
        assert_eq!(err.to_string(), "Relatorio nao encontrado.");
        Ok(())
    }

    #[tokio::test]
    async fn test_save_overwrites_by_name() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let db = FileBasedProvider::new(dir.path().join("history"));
        db.save_report(&name("lab"), "first").await?;
        db.save_report(&name("lab"), "second").await?;
        assert_eq!(db.get_report(&name("lab")).await?, "second");
        assert_eq!(db.list_reports().await?, vec!["lab"]);
        Ok(())
    }
}
