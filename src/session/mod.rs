//! Ambient session: the region and credentials the environment provides.

mod credentials;
mod sdk;

use std::io;
use std::sync::Arc;

use aws_config::{BehaviorVersion, SdkConfig};
use tracing::debug;

pub use credentials::{Credentials, ProvideCredentials};
pub use sdk::SdkCredentials;

#[derive(Debug, Clone)]
pub struct Session {
    region: Option<String>,
    credentials: Arc<dyn ProvideCredentials>,
}

impl Session {
    pub fn new(region: Option<String>, credentials: Arc<dyn ProvideCredentials>) -> Self {
        Self {
            region: region.filter(|r| !r.trim().is_empty()),
            credentials,
        }
    }

    /// Loads the ambient region and credentials through the AWS SDK default
    /// chains: environment variables, shared config and credentials files
    /// (honouring `AWS_PROFILE`, `AWS_CONFIG_FILE`,
    /// `AWS_SHARED_CREDENTIALS_FILE`), web identity, container and instance
    /// metadata.
    ///
    /// Missing credentials are not an error here; they surface when a token
    /// is issued.
    pub async fn load() -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_sdk_config(&sdk_config).await
    }

    /// [`Session::load`] for synchronous callers
    pub fn load_blocking() -> io::Result<Self> {
        sdk::block_on(Self::load())
    }

    pub async fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        let region = sdk_config.region().map(|region| region.as_ref().to_owned());
        let credentials = SdkCredentials::load(sdk_config.credentials_provider()).await;
        debug!(ambient_region = ?region, credentials = ?credentials, "session loaded");
        Self::new(region, Arc::new(credentials))
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into()).filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn ProvideCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Ambient region; `None` when the environment configures none
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn credentials(&self) -> &Arc<dyn ProvideCredentials> {
        &self.credentials
    }
}
