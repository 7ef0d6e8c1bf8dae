//! # CLI Configuration
//!
//! ## Sources (highest priority first)
//!
//! ```text
//! 1. Command-line flags          --service-url, --history-dir, --timeout-secs
//! 2. Environment variables       CALC_SERVICE_URL, CALC_HISTORY_DIR, CALC_TIMEOUT_SECS
//! 3. TOML config file            <config_dir>/calc/config.toml (or --config)
//! 4. Defaults                    http://localhost:5000, <data_dir>/calc, no timeout
//! ```
//!
//! Flags and environment variables are merged by clap before they get here.
//!
//! ## File format
//!
//! ```toml
//! [service]
//! url = "http://calc.internal:5000"
//! timeout_secs = 30
//!
//! [history]
//! dir = "/var/lib/calc"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Service URL used when nothing else is configured
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

const APP_DIR: &str = "calc";
const CONFIG_FILE: &str = "config.toml";

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub service: ServiceSection,
    pub history: HistorySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    pub dir: Option<PathBuf>,
}

/// Values taken from flags / environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub service_url: Option<String>,
    pub history_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub service_url: String,
    pub timeout: Option<Duration>,
    pub history_dir: PathBuf,
}

impl CliConfig {
    /// Resolve configuration from overrides, the config file and defaults.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let path = overrides.config_path.clone().or_else(default_config_path);
        let file = match &path {
            Some(path) => read_config_file(path, overrides.config_path.is_some())?,
            None => ConfigFile::default(),
        };
        let config = Self::resolve(overrides, file);
        debug!(
            service_url = %config.service_url,
            history_dir = %config.history_dir.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn resolve(overrides: &Overrides, file: ConfigFile) -> Self {
        let service_url = overrides
            .service_url
            .clone()
            .or(file.service.url)
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        let timeout = overrides
            .timeout_secs
            .or(file.service.timeout_secs)
            .map(Duration::from_secs);

        let history_dir = overrides
            .history_dir
            .clone()
            .or(file.history.dir)
            .unwrap_or_else(default_history_dir);

        CliConfig {
            service_url,
            timeout,
            history_dir,
        }
    }
}

/// Read a config file. A missing file is fine unless it was asked for explicitly.
fn read_config_file(path: &Path, required: bool) -> Result<ConfigFile> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found: {}", path.display());
        }
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ConfigFile::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("invalid config file {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

fn default_history_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::resolve(&Overrides::default(), ConfigFile::default());
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.timeout, None);
        assert!(config.history_dir.ends_with(APP_DIR));
    }

    #[test]
    fn test_file_values_apply() {
        let file: ConfigFile = toml::from_str(
            r#"
            [service]
            url = "http://calc.internal:5000"
            timeout_secs = 30
            "#,
        )
        .unwrap();
        let config = CliConfig::resolve(&Overrides::default(), file);
        assert_eq!(config.service_url, "http://calc.internal:5000");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_overrides_beat_file() {
        let file = ConfigFile {
            service: ServiceSection {
                url: Some("http://from-file".to_string()),
                timeout_secs: Some(5),
            },
            history: HistorySection {
                dir: Some(PathBuf::from("/from/file")),
            },
        };
        let overrides = Overrides {
            service_url: Some("http://from-flag".to_string()),
            history_dir: Some(PathBuf::from("/from/flag")),
            ..Overrides::default()
        };
        let config = CliConfig::resolve(&overrides, file);
        assert_eq!(config.service_url, "http://from-flag");
        assert_eq!(config.history_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[history]\ndir = \"/srv/calc\"\n").unwrap();

        let overrides = Overrides {
            config_path: Some(path),
            ..Overrides::default()
        };
        let config = CliConfig::load(&overrides).unwrap();
        assert_eq!(config.history_dir, PathBuf::from("/srv/calc"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let overrides = Overrides {
            config_path: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Overrides::default()
        };
        assert!(CliConfig::load(&overrides).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[service\nurl = ").unwrap();
        assert!(read_config_file(&path, true).is_err());
    }
}
