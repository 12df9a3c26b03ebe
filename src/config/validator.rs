//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - cache timeout sign and bound by token validity, signer expiry bounds,
//!   region shape, logging level

use tracing::error;

use crate::config::settings::{LoggingConfig, ServiceConfig};
use crate::utils::constants::MAX_TOKEN_EXPIRES_IN_SECS;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    let settings = &cfg.settings;

    if let Some(cache_timeout) = settings.cache_timeout {
        if cache_timeout < 0 {
            errors.push(format!(
                "settings.cache_timeout must be 0 or positive, got {}",
                cache_timeout
            ));
        }
    }

    if let Some(expires_in) = settings.expires_in {
        if expires_in == 0 || expires_in > MAX_TOKEN_EXPIRES_IN_SECS {
            errors.push(format!(
                "settings.expires_in must be between 1 and {} seconds, got {}",
                MAX_TOKEN_EXPIRES_IN_SECS, expires_in
            ));
        }
    }

    // a cached token must still be valid when handed out
    if let Some(cache_timeout) = settings.cache_timeout {
        let validity = settings.expires_in.unwrap_or(MAX_TOKEN_EXPIRES_IN_SECS);
        if cache_timeout > 0 && cache_timeout as u64 > validity {
            errors.push(format!(
                "settings.cache_timeout ({}s) must not exceed the token validity of {}s",
                cache_timeout, validity
            ));
        }
    }

    if let Some(region) = &settings.region {
        if region.chars().any(char::is_whitespace) && !region.trim().is_empty() {
            errors.push(format!(
                "settings.region '{}' must not contain whitespace",
                region
            ));
        }
    }

    if let Some(logging) = &settings.logging {
        validate_logging(logging, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        for e in &errors {
            error!("config error: {}", e);
        }
        Err(errors)
    }
}

fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<String>) {
    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "settings.logging.level '{}' is not one of {:?}",
            logging.level, LOG_LEVELS
        ));
    }
}
