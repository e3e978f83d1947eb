//! Client configuration model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FlashprepError, Result};

fn default_bootstrap_timeout_secs() -> u64 {
    10
}

/// Settings read once at startup.
///
/// Loaded by the infrastructure layer from the environment and the config
/// file; see `flashprep_infrastructure::config_service`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is appended to.
    pub base_url: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Upper bound for the identity provider's initial session query.
    #[serde(default = "default_bootstrap_timeout_secs")]
    pub bootstrap_timeout_secs: u64,
}

impl ApiConfig {
    /// Creates a config for `base_url` with default timeouts.
    ///
    /// The URL must be non-empty and use http or https. A trailing slash is
    /// removed so paths can always start with `/`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(Self {
            base_url,
            request_timeout_secs: None,
            bootstrap_timeout_secs: default_bootstrap_timeout_secs(),
        })
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn with_bootstrap_timeout(mut self, secs: u64) -> Self {
        self.bootstrap_timeout_secs = secs;
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout_secs)
    }

    /// Joins the base URL and a request path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(FlashprepError::config("base API URL is empty"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(FlashprepError::config(format!(
            "base API URL must start with http:// or https://, got '{}'",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ApiConfig::new("https://api.example.com/v1/").unwrap();
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(
            config.url("/getMyQuestions"),
            "https://api.example.com/v1/getMyQuestions"
        );
        assert_eq!(
            config.url("getMyQuestions"),
            "https://api.example.com/v1/getMyQuestions"
        );
    }

    #[test]
    fn test_rejects_empty_or_schemeless_url() {
        assert!(matches!(ApiConfig::new("  "), Err(FlashprepError::Config(_))));
        assert!(matches!(
            ApiConfig::new("api.example.com"),
            Err(FlashprepError::Config(_))
        ));
    }

    #[test]
    fn test_default_timeouts() {
        let config = ApiConfig::new("http://localhost:3000").unwrap();
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.bootstrap_timeout(), Duration::from_secs(10));
        let config = config.with_request_timeout(5).with_bootstrap_timeout(2);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.bootstrap_timeout(), Duration::from_secs(2));
    }
}
