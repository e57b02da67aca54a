use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";
pub const API_URL_ENV: &str = "TASKBOARD_API_URL";

const APP_DIR: &str = "taskboard";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no {0} directory available on this platform")]
    NoDir(&'static str),
}

/// Client settings, read from `config.toml` with every key optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub undo_window_secs: u64,
    pub token_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            undo_window_secs: 5,
            token_path: None,
            log_path: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply the environment and the
    /// command-line override, in that order.
    pub fn load(cli_api_url: Option<&str>) -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        let env_url = std::env::var(API_URL_ENV).ok();
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(env_url.as_deref(), cli_api_url);
        Ok(config)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_overrides(&mut self, env_url: Option<&str>, cli_url: Option<&str>) {
        let not_blank = |s: &&str| !s.trim().is_empty();
        if let Some(url) = cli_url.filter(not_blank).or(env_url.filter(not_blank)) {
            self.api_url = url.trim().to_string();
        }
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }

    pub fn token_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.token_path {
            Some(p) => Ok(p.clone()),
            None => Ok(data_dir()?.join("token")),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.log_path {
            Some(p) => Ok(p.clone()),
            None => Ok(data_dir()?.join("taskboard.log")),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoDir("config"))?;
    Ok(dir.join(APP_DIR).join("config.toml"))
}

fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = dirs::data_dir().ok_or(ConfigError::NoDir("data"))?;
    Ok(dir.join(APP_DIR))
}
