use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::remote::DEFAULT_ENDPOINT;

const APP_DIR_NAME: &str = "questfind";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which cache entry the explicit search path resolves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullSearchKey {
    /// Share the "all tasks" entry with suggestions and filter locally.
    #[default]
    AllTasks,
    /// Cache and fetch each explicit query under its own key.
    PerQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub request_timeout_ms: u64,
    pub debounce_ms: u64,
    pub full_search_key: FullSearchKey,
    pub store_path: PathBuf,
    pub log_level: String,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_ms: 10_000,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            full_search_key: FullSearchKey::AllTasks,
            store_path: base.join("cache.sqlite3"),
            log_level: "info".to_string(),
            config_path: base.join("config.toml"),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let endpoint = cfg.endpoint.trim();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ConfigError::Invalid(
            "endpoint must be an http(s) url".into(),
        ));
    }

    if !(100..=120_000).contains(&cfg.request_timeout_ms) {
        return Err(ConfigError::Invalid(
            "request_timeout_ms out of range".into(),
        ));
    }

    if cfg.debounce_ms > 5_000 {
        return Err(ConfigError::Invalid("debounce_ms out of range".into()));
    }

    if cfg.store_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("store_path is required".into()));
    }

    if cfg.log_level.trim().is_empty() {
        return Err(ConfigError::Invalid("log_level is required".into()));
    }

    Ok(())
}

/// Loads the config file at `path` (or the default location). A missing file
/// yields the defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::default().config_path);

    let mut cfg = match std::fs::read_to_string(&config_path) {
        Ok(raw) => toml::from_str::<Config>(&raw)?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(error) => return Err(ConfigError::Io(error)),
    };
    cfg.config_path = config_path;

    validate(&cfg)?;
    Ok(cfg)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg)?;
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    std::fs::write(&cfg.config_path, raw)?;
    Ok(())
}
