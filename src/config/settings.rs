use serde::Deserialize;

use crate::utils::constants::{DEFAULT_CACHE_TIMEOUT_SECS, DEFAULT_LOG_LEVEL};

/// ================================
/// Full configuration file
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// ================================
/// Token provider settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    /// default region; falls back to the ambient session region when absent
    pub region: Option<String>,
    /// seconds a token is reused for
    /// invariant: >= 0, 0 disables caching
    pub cache_timeout: Option<i64>,
    /// validity requested from the signer
    /// invariant: 1..=900
    pub expires_in: Option<u64>,
    pub logging: Option<LoggingConfig>,
}

impl SettingsConfig {
    pub fn cache_timeout(&self) -> i64 {
        self.cache_timeout.unwrap_or(DEFAULT_CACHE_TIMEOUT_SECS)
    }

    /// Configured region with blank values treated as absent
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().filter(|region| !region.trim().is_empty())
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

/// Used when the config has no logging section; the format follows
/// `LOG_FORMAT`
impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LEVEL.to_owned(), LogFormat::from_env())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON, anything else compact
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}
