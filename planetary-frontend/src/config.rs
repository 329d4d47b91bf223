use anyhow::Context;
use planetary_backend::module::caption::{DEFAULT_VIEWER_BASE, NameMappingConfig};
use planetary_backend::module::catalog::api_client::DEFAULT_API_BASE;
use planetary_backend::module::catalog::{CatalogClientConfig, DEFAULT_EXCLUDED_MISSIONS, Sampler};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::frontend::twitter::{DEFAULT_POST_URL, DEFAULT_UPLOAD_URL, TwitterCredentials};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "PLANETARY_BOT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_excluded_missions")]
    pub excluded_missions: Vec<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            excluded_missions: default_excluded_missions(),
        }
    }
}

impl SamplerConfig {
    pub fn sampler(&self) -> Sampler {
        Sampler::new(self.excluded_missions.iter().cloned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_viewer_base")]
    pub viewer_base: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            viewer_base: default_viewer_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    pub fn client_config(&self) -> CatalogClientConfig {
        CatalogClientConfig {
            api_base: self.api_base.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit between attempts; 0 retries immediately
    #[serde(default)]
    pub retry_delay_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub app_key: Option<String>,
    pub app_secret: Option<String>,
    pub oauth_token: Option<String>,
    pub oauth_token_secret: Option<String>,

    #[serde(default)]
    pub upload_url: Option<String>,

    #[serde(default)]
    pub post_url: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TwitterConfig {
    /// All four credentials, or None if any is missing or blank
    pub fn credentials(&self) -> Option<TwitterCredentials> {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Some(TwitterCredentials {
            app_key: present(&self.app_key)?,
            app_secret: present(&self.app_secret)?,
            oauth_token: present(&self.oauth_token)?,
            oauth_token_secret: present(&self.oauth_token_secret)?,
        })
    }

    pub fn upload_url(&self) -> &str {
        self.upload_url.as_deref().unwrap_or(DEFAULT_UPLOAD_URL)
    }

    pub fn post_url(&self) -> &str {
        self.post_url.as_deref().unwrap_or(DEFAULT_POST_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or_else(default_timeout_secs))
    }

    /// Take credentials from `TWITTER_*` variables where set
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields = [
            ("TWITTER_APP_KEY", &mut self.app_key),
            ("TWITTER_APP_SECRET", &mut self.app_secret),
            ("TWITTER_OAUTH_TOKEN", &mut self.oauth_token),
            ("TWITTER_OAUTH_TOKEN_SECRET", &mut self.oauth_token_secret),
        ];
        for (name, field) in fields {
            if let Some(value) = lookup(name) {
                *field = Some(value);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfigs {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also write daily log files here when set
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub names: NameMappingConfig,

    #[serde(default)]
    pub twitter: TwitterConfig,
}

impl Default for BotConfigs {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            dataset: DatasetConfig::default(),
            sampler: SamplerConfig::default(),
            catalog: CatalogConfig::default(),
            run: RunConfig::default(),
            names: NameMappingConfig::default(),
            twitter: TwitterConfig::default(),
        }
    }
}

impl BotConfigs {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: BotConfigs = toml::from_str(content)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_dataset_path() -> String {
    "opus-images.csv".to_string()
}

fn default_excluded_missions() -> Vec<String> {
    DEFAULT_EXCLUDED_MISSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_viewer_base() -> String {
    DEFAULT_VIEWER_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

/// Load the config file (defaults if it does not exist), then apply
/// credential overrides from the environment.
pub fn read_config(path: impl AsRef<Path>) -> anyhow::Result<BotConfigs> {
    let path = path.as_ref();
    let mut config = if path.exists() {
        BotConfigs::from_file(path)?
    } else {
        BotConfigs::default()
    };

    config
        .twitter
        .apply_env_overrides(|name| std::env::var(name).ok());

    Ok(config)
}

/// Config path from `PLANETARY_BOT_CONFIG`, else `config.toml`
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
