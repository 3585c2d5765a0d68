pub mod cleanup;

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use async_trait::async_trait;
use tokio::process::Command;
use netsentinel_schemas::project::ProjectName;
use netsentinel_schemas::settings::CaptureSettings;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Erro ao rodar TCPDump: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Falha na captura: Arquivo vazio. Verifique se rodou o app com SUDO.")]
    EmptyCapture(PathBuf),
    #[error("could not access capture file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The raw text file left behind by one capture run
#[derive(Debug, Clone)]
pub struct CaptureArtifact {
    pub path: PathBuf,
    pub size: u64,
}

impl CaptureArtifact {
    /// Read the whole capture. Bytes that are not valid UTF-8 are dropped rather than failing the
    /// analysis, the capture tool occasionally prints raw payload bytes in verbose mode.
    pub async fn read_text(&self) -> Result<String, CaptureError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CaptureError::Io { path: self.path.clone(), source })?;
        Ok(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect())
    }
}

/// Anything that can record traffic for a project into a text file
#[async_trait]
pub trait CaptureRunner {
    async fn capture(&self, project: &ProjectName) -> Result<CaptureArtifact, CaptureError>;
}

/// Runs tcpdump under `timeout` for the configured duration, stdout goes to `<project>.txt` and
/// stderr is thrown away. The exit code is not checked since `timeout` always reports 124 when
/// it has to stop the capture, an empty output file is the only failure signal.
pub struct TcpdumpCapture {
    pub settings: CaptureSettings,
}

impl TcpdumpCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    /// Full argv for one capture, including the privilege and timeout wrappers
    pub fn command_line(&self) -> Vec<String> {
        let mut cmd = Vec::new();
        if self.settings.use_sudo {
            // -n so a missing sudoers rule fails straight away instead of waiting on a password
            cmd.push("sudo".to_string());
            cmd.push("-n".to_string());
        }
        cmd.push("timeout".to_string());
        cmd.push(format!("{}s", self.settings.duration_secs));
        cmd.push(self.settings.tool.clone());
        cmd.push("-i".to_string());
        cmd.push(self.settings.interface.clone());
        cmd.push("-n".to_string());
        cmd.push("-v".to_string());
        cmd
    }

    pub fn capture_path(&self, project: &ProjectName) -> PathBuf {
        self.settings.directory.join(project.capture_file_name())
    }
}

#[async_trait]
impl CaptureRunner for TcpdumpCapture {
    async fn capture(&self, project: &ProjectName) -> Result<CaptureArtifact, CaptureError> {
        let path = self.capture_path(project);
        let io_err = |source| CaptureError::Io { path: path.clone(), source };

        tracing::info!(
            "starting capture for {project} on {} for {}s",
            self.settings.interface,
            self.settings.duration_secs,
        );

        let outfile = tokio::fs::File::create(&path).await.map_err(io_err)?;
        let outfile = outfile.into_std().await;

        let cmd = self.command_line();
        tracing::debug!("capture command: {cmd:?}");
        let status = Command::new(&cmd[0])
            .args(&cmd[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(outfile))
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|err| {
                tracing::error!("could not run capture process: {err:#}");
                CaptureError::Spawn(err)
            })?;
        tracing::debug!("capture process for {project} exited with {status}");

        let size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => return Err(io_err(err)),
        };
        if size == 0 {
            tracing::warn!("capture for {project} produced no output");
            return Err(CaptureError::EmptyCapture(path));
        }

        tracing::info!("capture for {project} finished, {size} bytes in {}", path.display());
        Ok(CaptureArtifact { path, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dir: &std::path::Path, tool: &str) -> CaptureSettings {
        CaptureSettings {
            interface: "any".to_string(),
            duration_secs: 2,
            tool: tool.to_string(),
            use_sudo: false,
            directory: dir.to_path_buf(),
            retention_hours: None,
        }
    }

    #[test]
    fn test_command_line_with_sudo() {
        let capture = TcpdumpCapture::new(CaptureSettings::default());
        assert_eq!(
            capture.command_line(),
            vec!["sudo", "-n", "timeout", "20s", "tcpdump", "-i", "any", "-n", "-v"],
        );
    }

    #[test]
    fn test_command_line_without_sudo() {
        let mut settings = CaptureSettings::default();
        settings.use_sudo = false;
        settings.interface = "eth0".to_string();
        settings.duration_secs = 5;
        let capture = TcpdumpCapture::new(settings);
        assert_eq!(
            capture.command_line(),
            vec!["timeout", "5s", "tcpdump", "-i", "eth0", "-n", "-v"],
        );
    }

    #[test]
    fn test_capture_path() {
        let capture = TcpdumpCapture::new(CaptureSettings::default());
        let project = ProjectName::sanitize("lab 1").unwrap();
        assert_eq!(capture.capture_path(&project), PathBuf::from("./lab1.txt"));
    }

    // `echo` stands in for tcpdump, it prints its arguments so the capture file is not empty
    #[tokio::test]
    async fn test_capture_writes_stdout_to_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let capture = TcpdumpCapture::new(settings(dir.path(), "echo"));
        let project = ProjectName::sanitize("lab").unwrap();

        let artifact = capture.capture(&project).await?;
        assert_eq!(artifact.path, dir.path().join("lab.txt"));
        assert!(artifact.size > 0);
        let text = artifact.read_text().await?;
        assert!(text.contains("any"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_capture_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let capture = TcpdumpCapture::new(settings(dir.path(), "true"));
        let project = ProjectName::sanitize("quiet").unwrap();

        let err = capture.capture(&project).await.unwrap_err();
        assert!(matches!(err, CaptureError::EmptyCapture(_)));
        assert!(err.to_string().starts_with("Falha na captura"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_tool_is_an_empty_capture() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let capture = TcpdumpCapture::new(settings(dir.path(), "netsentinel-no-such-tool"));
        let project = ProjectName::sanitize("missing").unwrap();

        let err = capture.capture(&project).await.unwrap_err();
        assert!(matches!(err, CaptureError::EmptyCapture(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_text_drops_invalid_utf8() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("raw.txt");
        tokio::fs::write(&path, b"IP 10.0.0.1 \xff\xfe> 10.0.0.2").await?;
        let artifact = CaptureArtifact { path, size: 0 };
        assert_eq!(artifact.read_text().await?, "IP 10.0.0.1 > 10.0.0.2");
        Ok(())
    }

    #[tokio::test]
    async fn test_read_text_keeps_encoded_replacement_character() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("raw.txt");
        // a real U+FFFD in the payload, then an invalid byte
        let mut bytes = "ssid \u{FFFD}cafe".as_bytes().to_vec();
        bytes.push(0xff);
        tokio::fs::write(&path, &bytes).await?;
        let artifact = CaptureArtifact { path, size: 0 };
        assert_eq!(artifact.read_text().await?, "ssid \u{FFFD}cafe");
        Ok(())
    }
}
