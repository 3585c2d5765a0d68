use std::path::PathBuf;
use clap::Parser;
use netsentinel_schemas::{API_KEY_ENV, NETSENTINEL_SETTINGS_FOLDER};
use netsentinel_schemas::settings::{ServerSettings, Settings};

/// CLI argument parsing for the server. Anything given here wins over the settings file.
#[derive(Parser, Debug, Default)]
#[command(version, about = "Capture network traffic and turn it into a security report")]
pub struct ServerArgs {
    /// Settings json, defaults are used if the file does not exist
    #[clap(long, short, default_value = "netsentinel.json")]
    pub config: PathBuf,
    #[clap(long)]
    pub ip: Option<String>,
    #[clap(long)]
    pub port: Option<u16>,
    /// Network interface to capture on
    #[clap(long, short)]
    pub interface: Option<String>,
    /// Length of every capture in seconds
    #[clap(long)]
    pub duration_secs: Option<u64>,
    /// Folder for the `<project>.txt` capture files
    #[clap(long)]
    pub capture_dir: Option<PathBuf>,
    /// Folder for the `<project>.md` reports
    #[clap(long)]
    pub history_dir: Option<PathBuf>,
    #[clap(long)]
    pub model: Option<String>,
    /// Run the capture tool directly instead of through sudo
    #[clap(long, action)]
    pub no_sudo: bool,
    /// Also write a daily rolling log file here
    #[clap(long)]
    pub log_dir: Option<PathBuf>,
    #[clap(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,
}

impl ServerArgs {
    /// Overlay the command line on top of the settings read from file
    pub fn apply(self, settings: &mut Settings) {
        if let Some(ip) = self.ip {
            settings.server.ip = ip;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(interface) = self.interface {
            settings.capture.interface = interface;
        }
        if let Some(duration_secs) = self.duration_secs {
            settings.capture.duration_secs = duration_secs;
        }
        if let Some(capture_dir) = self.capture_dir {
            settings.capture.directory = capture_dir;
        }
        if let Some(history_dir) = self.history_dir {
            settings.history.directory = history_dir;
        }
        if let Some(model) = self.model {
            settings.generation.model = model;
        }
        if self.no_sudo {
            settings.capture.use_sudo = false;
        }
        if let Some(log_dir) = self.log_dir {
            settings.logging.directory = Some(log_dir);
        }
        if let Some(api_key) = self.api_key {
            settings.generation.api_key = Some(api_key);
        }
    }
}

/// Read the settings file named on the command line then apply the remaining arguments.
pub async fn load_settings(args: ServerArgs) -> anyhow::Result<Settings> {
    let mut settings = Settings::read(&args.config).await?;
    args.apply(&mut settings);
    Ok(settings)
}

/// Use a fixed location for templates and scripts if running in release mode, since there is no
/// guarantee the working directory is the source tree. For debug mode we use the crate's own
/// assets folder. An explicit `assets_dir` in the settings always wins.
pub fn assets_dir(settings: &ServerSettings) -> PathBuf {
    if let Some(dir) = &settings.assets_dir {
        return dir.clone();
    }
    if cfg!(debug_assertions) {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
    } else {
        PathBuf::from(format!("{NETSENTINEL_SETTINGS_FOLDER}assets"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_settings() {
        let args = ServerArgs::parse_from([
            "netsentinel-server",
            "--port", "8080",
            "--interface", "wlan0",
            "--duration-secs", "5",
            "--history-dir", "/tmp/reports",
            "--no-sudo",
            "--api-key", "abc",
        ]);
        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.ip, "0.0.0.0");
        assert_eq!(settings.capture.interface, "wlan0");
        assert_eq!(settings.capture.duration_secs, 5);
        assert_eq!(settings.history.directory, PathBuf::from("/tmp/reports"));
        assert!(!settings.capture.use_sudo);
        assert_eq!(settings.generation.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_no_args_keeps_settings() {
        let mut settings = Settings::default();
        settings.capture.interface = "eth1".to_string();
        ServerArgs::default().apply(&mut settings);
        assert_eq!(settings.capture.interface, "eth1");
        assert!(settings.capture.use_sudo);
    }

    #[tokio::test]
    async fn test_load_settings_from_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("netsentinel.json");
        tokio::fs::write(&path, r#"{"capture": {"duration_secs": 7}, "server": {"port": 6000}}"#).await?;
        let args = ServerArgs {
            config: path,
            port: Some(7000),
            ..Default::default()
        };
        let settings = load_settings(args).await?;
        assert_eq!(settings.capture.duration_secs, 7);
        assert_eq!(settings.server.port, 7000);
        Ok(())
    }

    #[test]
    fn test_explicit_assets_dir() {
        let mut server = ServerSettings::default();
        server.assets_dir = Some(PathBuf::from("/opt/netsentinel/assets"));
        assert_eq!(assets_dir(&server), PathBuf::from("/opt/netsentinel/assets"));
    }
}
