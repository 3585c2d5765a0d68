use std::path::{Path, PathBuf};
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use netsentinel_schemas::project::sanitize_project_name;
use netsentinel_schemas::settings::CaptureSettings;

/// Capture files are kept after the report is written. If a retention is configured, this cron
/// job removes captures older than it once an hour. Nothing is scheduled otherwise.
pub async fn setup_capture_cleanup(
    settings: &CaptureSettings,
) -> anyhow::Result<()> {
    let Some(hours) = settings.retention_hours else {
        tracing::debug!("no capture retention configured, capture files are kept");
        return Ok(());
    };
    let max_age = retention_window(hours)?;
    tokio::fs::create_dir_all(&settings.directory)
        .await
        .with_context(|| format!("creating capture folder {}", settings.directory.display()))?;
    let directory = check_capture_directory(&settings.directory)?;
    tracing::info!("removing capture files older than {hours}h from {}", directory.display());

    let sched = JobScheduler::new().await?;
    sched.add(
        Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let directory = directory.clone();
            Box::pin(async move {
                tracing::debug!("running capture file cleanup");
                match remove_stale_captures(&directory, max_age).await {
                    Ok(removed) => {
                        for path in removed {
                            tracing::info!("capture file {} over retention, deleted", path.display());
                        }
                    }
                    Err(err) => tracing::error!("capture cleanup cronjob error: {err:#}"),
                }
            })
        })?
    ).await?;
    sched.start().await?;
    Ok(())
}

/// Convert the configured retention into a duration, rejecting values chrono cannot represent
pub fn retention_window(hours: u64) -> anyhow::Result<Duration> {
    let Ok(hours_signed) = i64::try_from(hours) else {
        bail!("capture retention of {hours}h is too large");
    };
    match Duration::try_hours(hours_signed) {
        Some(max_age) => Ok(max_age),
        None => bail!("capture retention of {hours}h is too large"),
    }
}

/// The sweep deletes `*.txt` files, so it is only allowed on a folder used for captures alone.
/// The server's working directory is refused, it is the default capture folder and usually holds
/// other text files.
pub fn check_capture_directory(directory: &Path) -> anyhow::Result<PathBuf> {
    let directory = directory
        .canonicalize()
        .with_context(|| format!("resolving capture folder {}", directory.display()))?;
    let working_dir = std::env::current_dir()?.canonicalize()?;
    if directory == working_dir {
        bail!(
            "capture retention needs a dedicated capture folder, {} is the working directory",
            directory.display(),
        );
    }
    Ok(directory)
}

/// Delete capture files in `directory` last modified more than `max_age` ago, returning the paths
/// that were removed. Only files whose name could have come from a project are touched. A file
/// that cannot be removed is logged and skipped.
pub async fn remove_stale_captures(
    directory: &Path,
    max_age: Duration,
) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.txt", glob::Pattern::escape(&directory.display().to_string()));
    let mut removed = Vec::new();
    let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
        return Ok(removed);
    };
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if !is_capture_file_name(&path) {
            tracing::debug!("{} is not a capture file, skipping", path.display());
            continue;
        }
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            continue;
        }
        let modified: DateTime<Utc> = metadata.modified()?.into();
        if modified < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(_) => removed.push(path),
                Err(err) => tracing::error!("could not delete {} with err: {err:#}", path.display()),
            }
        } else {
            tracing::debug!("capture file {} under retention, will not delete", path.display());
        }
    }
    Ok(removed)
}

/// Capture files are named after a sanitised project, anything else was not written by a capture
fn is_capture_file_name(path: &Path) -> bool {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => !stem.is_empty() && sanitize_project_name(stem) == stem,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn set_age(path: &Path, secs: u64) -> anyhow::Result<()> {
        let when = SystemTime::now() - std::time::Duration::from_secs(secs);
        std::fs::File::options().write(true).open(path)?.set_modified(when)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_only_old_captures_are_removed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let old = dir.path().join("old.txt");
        let fresh = dir.path().join("fresh.txt");
        let report = dir.path().join("old.md");
        for path in [&old, &fresh, &report] {
            std::fs::write(path, "data")?;
        }
        set_age(&old, 3 * 3600)?;
        set_age(&report, 3 * 3600)?;

        let removed = remove_stale_captures(dir.path(), Duration::hours(1)).await?;

        assert_eq!(removed, vec![old.clone()]);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(report.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_old_text_files_that_are_not_captures_survive() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let notes = dir.path().join("release notes.txt");
        let versioned = dir.path().join("requirements.v2.txt");
        for path in [&notes, &versioned] {
            std::fs::write(path, "keep me")?;
            set_age(path, 3 * 3600)?;
        }

        let removed = remove_stale_captures(dir.path(), Duration::hours(1)).await?;

        assert!(removed.is_empty());
        assert!(notes.exists());
        assert!(versioned.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_huge_retention_removes_nothing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let capture = dir.path().join("lab.txt");
        std::fs::write(&capture, "data")?;
        set_age(&capture, 3 * 3600)?;

        let removed = remove_stale_captures(dir.path(), Duration::max_value()).await?;

        assert!(removed.is_empty());
        assert!(capture.exists());
        Ok(())
    }

    #[test]
    fn test_retention_window() -> anyhow::Result<()> {
        assert_eq!(retention_window(24)?, Duration::hours(24));
        assert!(retention_window(u64::MAX).is_err());
        assert!(retention_window(i64::MAX as u64).is_err());
        assert!(retention_window(3_000_000_000_000_000).is_err());
        Ok(())
    }

    #[test]
    fn test_working_directory_is_refused() -> anyhow::Result<()> {
        assert!(check_capture_directory(Path::new(".")).is_err());
        let cwd = std::env::current_dir()?;
        assert!(check_capture_directory(&cwd).is_err());

        let dir = tempfile::tempdir()?;
        assert_eq!(check_capture_directory(dir.path())?, dir.path().canonicalize()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_retention_on_default_folder_fails_setup() {
        let settings = CaptureSettings {
            retention_hours: Some(24),
            ..CaptureSettings::default()
        };
        assert!(setup_capture_cleanup(&settings).await.is_err());
    }

    #[tokio::test]
    async fn test_no_retention_schedules_nothing() -> anyhow::Result<()> {
        setup_capture_cleanup(&CaptureSettings::default()).await?;
        Ok(())
    }
}
