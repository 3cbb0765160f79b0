//! Runtime configuration
//!
//! Options come from three layers with fixed precedence:
//! built-in defaults < JSON config file < CLI flags.
//! The config file uses the same camelCase keys the site tooling has
//! always used (`userDataDir`, `executablePath`, ...).

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Fully merged runtime options.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Account mail for the optional login step
    pub mail: Option<String>,
    /// Account password for the optional login step
    pub password: Option<String>,
    /// Output root for chapter directories
    pub out: PathBuf,
    /// Viewer URL of the chapter to download
    pub url: Option<String>,
    /// Run the browser headless
    pub headless: bool,
    /// Browser profile directory
    pub user_data_dir: PathBuf,
    /// Browser channel preference tokens (`stable`, `canary`, `chromium`, `*`, `r<digits>`)
    pub channel: Vec<String>,
    /// Explicit browser executable, bypassing channel resolution
    pub executable_path: Option<PathBuf>,
    /// Root for the managed chromium revision cache
    pub local_data_dir: PathBuf,
    /// Budget for every bounded wait, in milliseconds
    pub wait_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mail: None,
            password: None,
            out: PathBuf::from("manga"),
            url: None,
            headless: true,
            user_data_dir: PathBuf::from("data"),
            channel: vec!["stable".to_string()],
            executable_path: None,
            local_data_dir: PathBuf::from("data"),
            wait_timeout_ms: 120_000,
        }
    }
}

/// Values read from the JSON config file. Every field is optional so the
/// file only overrides what it mentions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileOverlay {
    mail: Option<String>,
    password: Option<String>,
    out: Option<PathBuf>,
    url: Option<String>,
    headless: Option<bool>,
    user_data_dir: Option<PathBuf>,
    channel: Option<Vec<String>>,
    executable_path: Option<PathBuf>,
    local_data_dir: Option<PathBuf>,
    wait_timeout_ms: Option<u64>,
}

/// Values taken from CLI flags. Applied last, so they win.
#[derive(Debug, Default, Clone)]
pub struct CliOverlay {
    /// `--mail`
    pub mail: Option<String>,
    /// `--password`
    pub password: Option<String>,
    /// `--out`
    pub out: Option<PathBuf>,
    /// `--url`
    pub url: Option<String>,
}

impl Config {
    /// Merge defaults, the config file (if present), and CLI flags.
    ///
    /// A missing config file is not an error; a present but malformed one is.
    pub fn load(config_path: Option<&Path>, cli: &CliOverlay) -> Result<Self> {
        let mut config = Self::default();
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let overlay: FileOverlay = serde_json::from_str(&raw)?;
                config.apply_file(overlay);
                debug!(path = %path.display(), "applied config file");
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
            }
            Err(err) => return Err(err.into()),
        }

        config.apply_cli(cli);
        Ok(config)
    }

    fn apply_file(&mut self, overlay: FileOverlay) {
        if overlay.mail.is_some() {
            self.mail = overlay.mail;
        }
        if overlay.password.is_some() {
            self.password = overlay.password;
        }
        if let Some(out) = overlay.out {
            self.out = out;
        }
        if overlay.url.is_some() {
            self.url = overlay.url;
        }
        if let Some(headless) = overlay.headless {
            self.headless = headless;
        }
        if let Some(dir) = overlay.user_data_dir {
            self.user_data_dir = dir;
        }
        if let Some(channel) = overlay.channel {
            self.channel = channel;
        }
        if overlay.executable_path.is_some() {
            self.executable_path = overlay.executable_path;
        }
        if let Some(dir) = overlay.local_data_dir {
            self.local_data_dir = dir;
        }
        if let Some(ms) = overlay.wait_timeout_ms {
            self.wait_timeout_ms = ms;
        }
    }

    fn apply_cli(&mut self, cli: &CliOverlay) {
        if cli.mail.is_some() {
            self.mail = cli.mail.clone();
        }
        if cli.password.is_some() {
            self.password = cli.password.clone();
        }
        if let Some(out) = &cli.out {
            self.out = out.clone();
        }
        if cli.url.is_some() {
            self.url = cli.url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp config");
        file.write_all(json.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.out, PathBuf::from("manga"));
        assert!(config.headless);
        assert_eq!(config.user_data_dir, PathBuf::from("data"));
        assert_eq!(config.channel, vec!["stable".to_string()]);
        assert!(config.mail.is_none());
        assert!(config.url.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(
            Some(Path::new("/definitely/not/here.json")),
            &CliOverlay::default(),
        )
        .expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            r#"{
                "out": "archive",
                "headless": false,
                "userDataDir": "profile",
                "channel": ["canary", "chromium"],
                "mail": "reader@example.com"
            }"#,
        );
        let config = Config::load(Some(file.path()), &CliOverlay::default()).expect("load");
        assert_eq!(config.out, PathBuf::from("archive"));
        assert!(!config.headless);
        assert_eq!(config.user_data_dir, PathBuf::from("profile"));
        assert_eq!(config.channel, vec!["canary", "chromium"]);
        assert_eq!(config.mail.as_deref(), Some("reader@example.com"));
        // Untouched keys keep their defaults.
        assert_eq!(config.local_data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config(r#"{"out": "from-file", "mail": "file@example.com"}"#);
        let cli = CliOverlay {
            out: Some(PathBuf::from("from-cli")),
            url: Some("https://comic.k-manga.jp/title/1/2/3/pv".to_string()),
            ..Default::default()
        };
        let config = Config::load(Some(file.path()), &cli).expect("load");
        assert_eq!(config.out, PathBuf::from("from-cli"));
        assert_eq!(config.mail.as_deref(), Some("file@example.com"));
        assert_eq!(
            config.url.as_deref(),
            Some("https://comic.k-manga.jp/title/1/2/3/pv")
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = write_config("{not json");
        assert!(Config::load(Some(file.path()), &CliOverlay::default()).is_err());
    }
}
