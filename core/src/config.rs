//! Construction-time settings for `CanvasClient` and `BlockingClient`.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::fields::Secret;

pub const DEFAULT_BASE_URL: &str = "https://api.dockerclaw.dev";
pub const DEFAULT_API_PREFIX: &str = "/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Client settings. Only the API key is required.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Secret,
    pub base_url: String,
    /// Path prefix in front of every endpoint: `/v1` or `/api`
    /// depending on the deployment.
    pub api_prefix: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<Secret>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `CANVAS_API_KEY` (required), `CANVAS_BASE_URL`,
    /// `CANVAS_API_PREFIX` and `CANVAS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("CANVAS_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("CANVAS_API_KEY"))?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup("CANVAS_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(prefix) = lookup("CANVAS_API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Some(raw) = lookup("CANVAS_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "CANVAS_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = ClientConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_prefix, "/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn api_key_is_required() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CANVAS_API_KEY"));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CANVAS_API_KEY", "dc_123"),
            ("CANVAS_BASE_URL", "http://localhost:3001"),
            ("CANVAS_API_PREFIX", "/api"),
            ("CANVAS_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.expose(), "dc_123");
        assert_eq!(config.base_url, "http://localhost:3001");
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("CANVAS_API_KEY", "dc_123"),
            ("CANVAS_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CANVAS_TIMEOUT_SECS", .. }));
    }
}
