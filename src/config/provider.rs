use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::auth::TokenProvider;
use crate::config::settings::SettingsConfig;
use crate::session::Session;
use crate::signer::RdsTokenIssuer;

/// Build a presigning provider from loaded settings
pub fn build_provider(settings: &SettingsConfig, session: Session) -> Result<TokenProvider> {
    let mut issuer = RdsTokenIssuer::from_session(&session);
    if let Some(expires_in) = settings.expires_in {
        issuer = issuer.with_expires_in(Duration::from_secs(expires_in))?;
    }

    let mut builder = TokenProvider::builder()
        .session(session)
        .cache_timeout(settings.cache_timeout());
    if let Some(region) = settings.region() {
        builder = builder.region_name(region);
    }

    let provider = builder
        .build_with_issuer(issuer)
        .context("building token provider")?;
    info!(
        region = ?provider.region_name(),
        cache_timeout_secs = provider.cache_timeout().as_secs(),
        "token provider ready"
    );
    Ok(provider)
}
