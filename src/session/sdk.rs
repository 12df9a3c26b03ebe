use std::fmt;
use std::future::Future;
use std::io;
use std::panic;
use std::thread;
use std::time::{Duration, SystemTime};

use aws_credential_types::provider::{ProvideCredentials as _, SharedCredentialsProvider};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::credentials::{Credentials, ProvideCredentials};
use crate::signer::SigningError;
use crate::utils::constants::CREDENTIALS_REFRESH_MARGIN_SECS;

const NO_PROVIDER: &str = "no credentials provider configured";

/// Credentials resolved through the AWS SDK provider chain (environment,
/// shared profile files, web identity, container and instance metadata).
///
/// The chain is resolved once up front and the result kept, so signing
/// stays synchronous. Temporary credentials are resolved again once they
/// come within [`CREDENTIALS_REFRESH_MARGIN_SECS`] of their expiry; a
/// failed refresh keeps the previous credentials until they actually expire.
pub struct SdkCredentials {
    provider: Option<SharedCredentialsProvider>,
    resolved: RwLock<Result<Resolved, String>>,
}

#[derive(Clone)]
struct Resolved {
    credentials: Credentials,
    expiry: Option<SystemTime>,
}

impl Resolved {
    fn expires_within(&self, margin: Duration) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry <= SystemTime::now() + margin)
    }
}

impl SdkCredentials {
    pub async fn load(provider: Option<SharedCredentialsProvider>) -> Self {
        let resolved = match &provider {
            Some(provider) => resolve(provider).await,
            None => Err(NO_PROVIDER.to_owned()),
        };
        Self {
            provider,
            resolved: RwLock::new(resolved),
        }
    }

    /// Resolves the chain again and keeps the outcome
    pub async fn refresh(&self) -> Result<(), SigningError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| SigningError::MissingCredentials(NO_PROVIDER.to_owned()))?;

        match resolve(provider).await {
            Ok(resolved) => {
                *self.resolved.write() = Ok(resolved);
                Ok(())
            }
            Err(reason) => {
                let mut kept = self.resolved.write();
                if kept.is_err() {
                    *kept = Err(reason.clone());
                }
                Err(SigningError::MissingCredentials(reason))
            }
        }
    }

    /// Expiry of the kept credentials; `None` for long-term keys or when
    /// nothing was resolved
    pub fn expiry(&self) -> Option<SystemTime> {
        self.resolved.read().as_ref().ok().and_then(|r| r.expiry)
    }

    fn needs_refresh(&self) -> bool {
        match &*self.resolved.read() {
            Ok(resolved) => {
                resolved.expires_within(Duration::from_secs(CREDENTIALS_REFRESH_MARGIN_SECS))
            }
            Err(_) => true,
        }
    }
}

impl ProvideCredentials for SdkCredentials {
    fn provide_credentials(&self) -> Result<Credentials, SigningError> {
        if self.provider.is_some() && self.needs_refresh() {
            debug!("kept credentials are missing or about to expire, refreshing");
            match block_on(self.refresh()) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(error = %error, "credential refresh failed"),
                Err(error) => warn!(error = %error, "cannot run credential refresh"),
            }
        }

        match &*self.resolved.read() {
            Ok(resolved) if resolved.expires_within(Duration::ZERO) => {
                Err(SigningError::ExpiredCredentials)
            }
            Ok(resolved) => Ok(resolved.credentials.clone()),
            Err(reason) => Err(SigningError::MissingCredentials(reason.clone())),
        }
    }
}

impl fmt::Debug for SdkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let resolved = self.resolved.read();
        f.debug_struct("SdkCredentials")
            .field("provider", &self.provider.is_some())
            .field(
                "access_key_id",
                &resolved.as_ref().ok().map(|r| r.credentials.access_key_id().to_owned()),
            )
            .field("expiry", &resolved.as_ref().ok().and_then(|r| r.expiry))
            .finish()
    }
}

async fn resolve(provider: &SharedCredentialsProvider) -> Result<Resolved, String> {
    match provider.provide_credentials().await {
        Ok(credentials) => {
            debug!(
                access_key_id = %credentials.access_key_id(),
                expiry = ?credentials.expiry(),
                "resolved AWS credentials"
            );
            Ok(Resolved {
                credentials: Credentials::from(&credentials),
                expiry: credentials.expiry(),
            })
        }
        Err(error) => {
            warn!(error = %error, "could not resolve AWS credentials");
            Err(error.to_string())
        }
    }
}

/// Drives `future` to completion on a scoped thread with its own
/// current-thread runtime, so it can be called from synchronous code
/// whether or not a tokio runtime is already running on this thread.
pub(super) fn block_on<F>(future: F) -> io::Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    thread::scope(|scope| {
        let handle = scope.spawn(|| {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map(|runtime| runtime.block_on(future))
        });
        match handle.join() {
            Ok(output) => output,
            Err(panic) => panic::resume_unwind(panic),
        }
    })
}
