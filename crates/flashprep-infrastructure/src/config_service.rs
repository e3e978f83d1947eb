//! Startup configuration loading.
//!
//! Priority: environment variables > `config.toml` > defaults.
//!
//! ```text
//! ~/.config/flashprep/
//! └── config.toml
//! ```

use std::path::{Path, PathBuf};

use flashprep_core::config::ApiConfig;
use flashprep_core::error::{FlashprepError, Result};
use serde::Deserialize;

pub const ENV_API_URL: &str = "FLASHPREP_API_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "FLASHPREP_REQUEST_TIMEOUT_SECS";
pub const ENV_BOOTSTRAP_TIMEOUT: &str = "FLASHPREP_BOOTSTRAP_TIMEOUT_SECS";
pub const ENV_AUTH_URL: &str = "FLASHPREP_AUTH_URL";
pub const ENV_AUTH_ANON_KEY: &str = "FLASHPREP_AUTH_ANON_KEY";

/// Identity provider endpoint settings. Optional as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: String,
}

/// Everything the application reads once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    auth: AuthSection,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    bootstrap_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSection {
    url: Option<String>,
    anon_key: Option<String>,
}

/// Loads [`AppConfig`] from the environment and an optional config file.
pub struct ConfigService {
    config_path: Option<PathBuf>,
}

impl ConfigService {
    /// Uses the platform config directory (`~/.config/flashprep/config.toml` on Linux).
    pub fn new_default() -> Self {
        Self {
            config_path: default_config_path(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Loads using the process environment.
    pub fn load(&self) -> Result<AppConfig> {
        self.load_with(|key| std::env::var(key).ok())
    }

    /// Loads using `lookup` for environment values.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = self.read_file()?;
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = env(ENV_API_URL).or(file.api.base_url).ok_or_else(|| {
            FlashprepError::config(format!(
                "no base API URL: set {} or api.base_url in {}",
                ENV_API_URL,
                self.describe_path()
            ))
        })?;

        let mut api = ApiConfig::new(base_url)?;
        if let Some(secs) = parse_secs(env(ENV_REQUEST_TIMEOUT), ENV_REQUEST_TIMEOUT)?
            .or(file.api.request_timeout_secs)
        {
            api = api.with_request_timeout(secs);
        }
        if let Some(secs) = parse_secs(env(ENV_BOOTSTRAP_TIMEOUT), ENV_BOOTSTRAP_TIMEOUT)?
            .or(file.api.bootstrap_timeout_secs)
        {
            api = api.with_bootstrap_timeout(secs);
        }

        let auth_url = env(ENV_AUTH_URL).or(file.auth.url);
        let anon_key = env(ENV_AUTH_ANON_KEY).or(file.auth.anon_key);
        let auth = match (auth_url, anon_key) {
            (Some(url), Some(anon_key)) => Some(AuthConfig {
                url: url.trim().trim_end_matches('/').to_string(),
                anon_key,
            }),
            (None, None) => None,
            _ => {
                return Err(FlashprepError::config(format!(
                    "{} and {} must be set together",
                    ENV_AUTH_URL, ENV_AUTH_ANON_KEY
                )));
            }
        };

        tracing::debug!(
            "[ConfigService] base_url={} auth={}",
            api.base_url,
            auth.is_some()
        );
        Ok(AppConfig { api, auth })
    }

    fn read_file(&self) -> Result<ConfigFile> {
        let Some(path) = &self.config_path else {
            return Ok(ConfigFile::default());
        };
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlashprepError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn describe_path(&self) -> String {
        self.config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "config.toml".to_string())
    }
}

fn parse_secs(raw: Option<String>, key: &str) -> Result<Option<u64>> {
    raw.map(|value| {
        value.trim().parse::<u64>().map_err(|_| {
            FlashprepError::config(format!("{} must be a whole number of seconds", key))
        })
    })
    .transpose()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flashprep").join("config.toml"))
}
