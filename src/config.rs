use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_URL_VAR: &str = "VITE_API_URL";
pub const CSRF_URL_VAR: &str = "VITE_CSRF_URL";

/// Lifetime of a settled CSRF fetch before the next call refreshes it.
pub const DEFAULT_CSRF_REFRESH_MS: u64 = 1000;
pub const DEFAULT_PER_PAGE: u32 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_csrf_refresh_ms() -> u64 {
    DEFAULT_CSRF_REFRESH_MS
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

/// On-disk tuning. Every key is optional; the URLs only come from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_csrf_refresh_ms")]
    pub csrf_refresh_ms: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub debug_logging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,
    /// Endpoint that sets the `XSRF-TOKEN` cookie.
    pub csrf_url: String,
    pub csrf_refresh: Duration,
    /// Page size used when a paginated listing does not ask for one.
    pub per_page: u32,
    pub debug_logging: bool,
}

impl ApiConfig {
    pub fn new(api_url: &str, csrf_url: &str) -> Self {
        Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            csrf_url: csrf_url.trim().to_string(),
            csrf_refresh: Duration::from_millis(DEFAULT_CSRF_REFRESH_MS),
            per_page: DEFAULT_PER_PAGE,
            debug_logging: false,
        }
    }

    /// Both URLs from the environment, default tuning.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(FileConfig::default(), |key| std::env::var(key).ok())
    }

    /// URLs from the environment, tuning from the config file when present.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        match Self::default_path() {
            Some(path) if path.exists() => Ok(config.tuned(FileConfig::read(&path)?)),
            _ => Ok(config),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("herdbook").join("config.toml"))
    }

    /// Both URLs from `env`, failing on the first one unset or blank.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let require = |var: &'static str| {
            env(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(var))
        };
        let api_url = require(API_URL_VAR)?;
        let csrf_url = require(CSRF_URL_VAR)?;
        Ok(Self::new(&api_url, &csrf_url).tuned(file))
    }

    fn tuned(mut self, file: FileConfig) -> Self {
        if file.csrf_refresh_ms > 0 {
            self.csrf_refresh = Duration::from_millis(file.csrf_refresh_ms);
        }
        if file.per_page > 0 {
            self.per_page = file.per_page;
        }
        self.debug_logging = file.debug_logging;
        self
    }
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
