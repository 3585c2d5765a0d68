use std::fmt;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// All configuration for the server. This is read once at startup and then shared read-only with
/// every component, nothing in here is changed while requests are being served.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct ServerSettings {
    /// listen address, all interfaces by default so the page is reachable from other machines
    #[serde(default = "default_ip")]
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// folder holding `templates/` and `scripts/`, if not set the server picks a location based
    /// on the build profile
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            assets_dir: None,
        }
    }
}

/// How the packet capture tool is run
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct CaptureSettings {
    /// interface passed to `-i`, `any` listens on all of them
    #[serde(default = "default_interface")]
    pub interface: String,
    /// wall clock length of every capture
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    /// capture binary, looked up in PATH
    #[serde(default = "default_tool")]
    pub tool: String,
    /// prefix the command with `sudo -n`, the capture tool needs root to open the interface
    #[serde(default = "default_use_sudo")]
    pub use_sudo: bool,
    /// where `<project>.txt` files are written
    #[serde(default = "default_capture_directory")]
    pub directory: PathBuf,
    /// if set, capture files older than this are swept up every hour
    #[serde(default)]
    pub retention_hours: Option<u64>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            duration_secs: default_duration_secs(),
            tool: default_tool(),
            use_sudo: default_use_sudo(),
            directory: default_capture_directory(),
            retention_hours: None,
        }
    }
}

/// Model and sampling parameters for the generative language API
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct GenerationSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// the key is never written back out
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            api_key: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct HistorySettings {
    /// flat folder of `<project>.md` reports
    #[serde(default = "default_history_directory")]
    pub directory: PathBuf,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            directory: default_history_directory(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub struct LoggingSettings {
    /// if set, a daily rolling `server.log` is written here as well as stdout
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_ip() -> String {"0.0.0.0".to_string()}
fn default_port() -> u16 {5000}
fn default_interface() -> String {"any".to_string()}
fn default_duration_secs() -> u64 {20}
fn default_tool() -> String {"tcpdump".to_string()}
fn default_use_sudo() -> bool {true}
fn default_capture_directory() -> PathBuf {PathBuf::from(".")}
fn default_model() -> String {"models/gemini-2.5-flash".to_string()}
fn default_api_base() -> String {"https://generativelanguage.googleapis.com/v1beta".to_string()}
fn default_temperature() -> f32 {0.3}
fn default_top_p() -> f32 {0.95}
fn default_top_k() -> u32 {64}
fn default_max_output_tokens() -> u32 {8192}
fn default_history_directory() -> PathBuf {PathBuf::from("history")}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Settings {
    /// Read the settings json, a missing file is not an error and gives the defaults.
    pub async fn read(path: &Path) -> anyhow::Result<Settings> {
        tracing::trace!("expected settings json location: {:?}", path);
        if path.is_file() {
            let text = tokio::fs::read_to_string(path).await?;
            let settings: Settings = serde_json::from_str(&text)
                .with_context(|| format!("parsing settings file {}", path.display()))?;
            Ok(settings)
        } else {
            tracing::info!("no settings file at {}, using defaults", path.display());
            Ok(Settings::default())
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.generation
            .api_key
            .as_ref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.capture.interface, "any");
        assert_eq!(settings.capture.duration_secs, 20);
        assert!(settings.capture.use_sudo);
        assert_eq!(settings.capture.retention_hours, None);
        assert_eq!(settings.generation.model, "models/gemini-2.5-flash");
        assert_eq!(settings.generation.temperature, 0.3);
        assert_eq!(settings.generation.top_p, 0.95);
        assert_eq!(settings.generation.top_k, 64);
        assert_eq!(settings.generation.max_output_tokens, 8192);
        assert_eq!(settings.history.directory, PathBuf::from("history"));
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_partial_json_fills_defaults() -> anyhow::Result<()> {
        let settings: Settings = serde_json::from_str(r#"{"capture": {"interface": "eth0"}}"#)?;
        assert_eq!(settings.capture.interface, "eth0");
        assert_eq!(settings.capture.duration_secs, 20);
        assert_eq!(settings.server.ip, "0.0.0.0");
        Ok(())
    }

    #[test]
    fn test_api_key_is_not_serialised() -> anyhow::Result<()> {
        let mut settings = Settings::default();
        settings.generation.api_key = Some("secret".to_string());
        assert!(settings.has_api_key());
        let json = format!("{settings}");
        assert!(!json.contains("secret"));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_missing_file_gives_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let settings = Settings::read(&dir.path().join("settings.json")).await?;
        assert_eq!(settings.server.port, 5000);
        Ok(())
    }

    #[tokio::test]
    async fn test_displayed_settings_read_back() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.capture.duration_secs = 5;
        tokio::fs::write(&path, format!("{settings}")).await?;
        let read_back = Settings::read(&path).await?;
        assert_eq!(read_back.capture.duration_secs, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_invalid_json_fails() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "not json").await?;
        assert!(Settings::read(&path).await.is_err());
        Ok(())
    }
}
