use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod defaults;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::logo_cache::fetcher::{
    DirectoryLogoFetcher, HttpLogoFetcher, LogoFetcher, NoLogoFetcher,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_logo_cache_path")]
    pub logo_cache_path: PathBuf,
}

/// Which source the cache asks on a miss
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Never finds a logo
    #[default]
    None,
    /// Remote HTTP source built from `url_template`
    Http,
    /// Local asset directory
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    #[serde(default)]
    pub kind: FetcherKind,
    /// Required for `http`; `{name}` and `{key}` are substituted per request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
    /// Required for `directory`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<PathBuf>,
    #[serde(default = "default_fetch_timeout")]
    pub timeout: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_image_size")]
    pub max_image_size: usize,
}

fn default_logo_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOGO_CACHE_PATH)
}

fn default_fetch_timeout() -> String {
    DEFAULT_FETCH_TIMEOUT.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_image_size() -> usize {
    DEFAULT_MAX_IMAGE_SIZE
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            logo_cache_path: default_logo_cache_path(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            kind: FetcherKind::default(),
            url_template: None,
            asset_dir: None,
            timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
            max_image_size: default_max_image_size(),
        }
    }
}

impl FetcherConfig {
    pub fn timeout_duration(&self) -> AppResult<Duration> {
        humantime::parse_duration(&self.timeout).map_err(|e| {
            AppError::configuration(format!("invalid fetcher.timeout '{}': {}", self.timeout, e))
        })
    }

    /// Build the fetch source selected by `kind`
    pub fn build_fetcher(&self) -> AppResult<Arc<dyn LogoFetcher>> {
        match self.kind {
            FetcherKind::None => Ok(Arc::new(NoLogoFetcher)),
            FetcherKind::Http => {
                let template = self.url_template.clone().ok_or_else(|| {
                    AppError::configuration("fetcher.url_template is required for kind = \"http\"")
                })?;
                let fetcher = HttpLogoFetcher::new(
                    template,
                    self.timeout_duration()?,
                    &self.user_agent,
                    self.max_image_size,
                )?;
                Ok(Arc::new(fetcher))
            }
            FetcherKind::Directory => {
                let asset_dir = self.asset_dir.clone().ok_or_else(|| {
                    AppError::configuration(
                        "fetcher.asset_dir is required for kind = \"directory\"",
                    )
                })?;
                Ok(Arc::new(DirectoryLogoFetcher::new(asset_dir)))
            }
        }
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}
