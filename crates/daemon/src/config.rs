use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "secretfs";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// On-disk configuration, every field optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily rolling log files (stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Let users other than the mounter access the filesystem
    #[serde(default)]
    pub allow_other: bool,
    /// Name shown as the mount source
    #[serde(default = "default_fs_name")]
    pub fs_name: String,
    /// How long the kernel may cache attributes and entries
    #[serde(default = "default_attr_ttl_secs")]
    pub attr_ttl_secs: u64,
    /// Extra FUSE mount options, as given to `-o`
    #[serde(default)]
    pub mount_options: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fs_name() -> String {
    APP_NAME.to_string()
}

fn default_attr_ttl_secs() -> u64 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            allow_other: false,
            fs_name: default_fs_name(),
            attr_ttl_secs: default_attr_ttl_secs(),
            mount_options: Vec::new(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/secretfs/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDirectory)?;
        Ok(dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config file at `path`, or at the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Ok(p) => (p, false),
                Err(_) => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let config_toml = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&config_toml)
    }

    pub fn from_toml(config_toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config_toml)?)
    }
}

/// Resolved configuration used by the process layer
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
    pub allow_other: bool,
    pub fs_name: String,
    pub attr_ttl: Duration,
    pub mount_options: Vec<String>,
}

impl Config {
    /// Merge the file config with command line overrides
    pub fn resolve(
        app: AppConfig,
        log_level: Option<tracing::Level>,
        log_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let log_level = match log_level {
            Some(level) => level,
            None => tracing::Level::from_str(&app.log_level)
                .map_err(|_| ConfigError::InvalidLogLevel(app.log_level.clone()))?,
        };

        Ok(Self {
            log_level,
            log_dir: log_dir.or(app.log_dir),
            allow_other: app.allow_other,
            fs_name: app.fs_name,
            attr_ttl: Duration::from_secs(app.attr_ttl_secs),
            mount_options: app.mount_options,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            log_dir: None,
            allow_other: false,
            fs_name: default_fs_name(),
            attr_ttl: Duration::from_secs(default_attr_ttl_secs()),
            mount_options: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config directory found")]
    NoConfigDirectory,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid log level: {0:?}")]
    InvalidLogLevel(String),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
