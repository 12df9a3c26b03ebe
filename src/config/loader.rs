use std::path::Path;

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error};

use crate::config::settings::{LoggingConfig, ServiceConfig};
use crate::config::validator::validate_service_config;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::DEFAULT_CACHE_TIMEOUT_SECS;

lazy_static! {
    static ref ENV_VAR_RE: Regex = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").unwrap();
}

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config file '{}'", path.display()))?;

    parse_config(&expand_env_vars(&content))
}

/// Parse YAML content, apply defaults and validate.
///
/// Validation failures are aggregated into a single error message.
pub fn parse_config(content: &str) -> Result<ServiceConfig> {
    let mut service_config: ServiceConfig = serde_yaml::from_str(content).inspect_err(|e| {
        error!("parse config error: {}", e);
        get_metrics().config_errors.inc();
    })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::default());
    }
    if service_config.settings.cache_timeout.is_none() {
        service_config.settings.cache_timeout = Some(DEFAULT_CACHE_TIMEOUT_SECS);
    }

    debug!("validating config ...");
    validate_service_config(&service_config).map_err(|errors| {
        get_metrics().config_errors.inc_by(errors.len() as u64);
        anyhow!("config is not valid: {}", errors.join("; "))
    })?;

    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with environment values
pub fn expand_env_vars(input: &str) -> String {
    ENV_VAR_RE
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}
