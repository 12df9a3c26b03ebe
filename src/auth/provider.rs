use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::auth::error::{AuthError, ConfigurationError};
use crate::cache::cache_key::CacheKey;
use crate::cache::token_cache::TokenCache;
use crate::connect::ConnectParams;
use crate::observability::metrics::get_metrics;
use crate::session::Session;
use crate::signer::{AuthTokenIssuer, RdsTokenIssuer, TokenRequest};
use crate::utils::constants::DEFAULT_CACHE_TIMEOUT_SECS;

/// Issues IAM auth tokens for database connections and caches them.
///
/// Tokens are cached per `(user, host, port, region)` for `cache_timeout`
/// seconds. Each provider owns its cache; nothing is shared between
/// providers.
pub struct TokenProvider<I = RdsTokenIssuer> {
    region_name: Option<String>,
    session: Session,
    cache_timeout: Duration,
    issuer: I,
    cache: TokenCache,
}

/// Builder for [`TokenProvider`]
#[derive(Debug, Clone)]
pub struct TokenProviderBuilder {
    region_name: Option<String>,
    session: Option<Session>,
    cache_timeout: i64,
}

impl Default for TokenProviderBuilder {
    fn default() -> Self {
        Self {
            region_name: None,
            session: None,
            cache_timeout: DEFAULT_CACHE_TIMEOUT_SECS,
        }
    }
}

impl TokenProviderBuilder {
    /// Default region used when a request does not name one
    pub fn region_name(mut self, region_name: impl Into<String>) -> Self {
        self.region_name = Some(region_name.into());
        self
    }

    /// Session supplying the ambient region and credentials. Defaults to
    /// [`Session::load_blocking`].
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Seconds to reuse a token for; 0 disables caching
    pub fn cache_timeout(mut self, cache_timeout: i64) -> Self {
        self.cache_timeout = cache_timeout;
        self
    }

    /// Builds a provider that presigns tokens with the session credentials
    pub fn build(mut self) -> Result<TokenProvider<RdsTokenIssuer>, ConfigurationError> {
        self.check_cache_timeout()?;
        let session = self.take_session()?;
        let issuer = RdsTokenIssuer::from_session(&session);
        self.session(session).build_with_issuer(issuer)
    }

    pub fn build_with_issuer<I>(mut self, issuer: I) -> Result<TokenProvider<I>, ConfigurationError>
    where
        I: AuthTokenIssuer,
    {
        let cache_timeout = self.check_cache_timeout()?;
        let session = self.take_session()?;

        Ok(TokenProvider {
            region_name: self.region_name.filter(|r| !r.trim().is_empty()),
            session,
            cache_timeout,
            issuer,
            cache: TokenCache::new(cache_timeout),
        })
    }

    fn check_cache_timeout(&self) -> Result<Duration, ConfigurationError> {
        if self.cache_timeout < 0 {
            return Err(ConfigurationError::NegativeCacheTimeout(self.cache_timeout));
        }
        Ok(Duration::from_secs(self.cache_timeout as u64))
    }

    fn take_session(&mut self) -> Result<Session, ConfigurationError> {
        match self.session.take() {
            Some(session) => Ok(session),
            None => Session::load_blocking()
                .map_err(|e| ConfigurationError::SessionUnavailable(e.to_string())),
        }
    }
}

impl TokenProvider<RdsTokenIssuer> {
    pub fn builder() -> TokenProviderBuilder {
        TokenProviderBuilder::default()
    }

    pub fn new(
        region_name: Option<String>,
        session: Option<Session>,
        cache_timeout: i64,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = Self::builder().cache_timeout(cache_timeout);
        if let Some(region_name) = region_name {
            builder = builder.region_name(region_name);
        }
        if let Some(session) = session {
            builder = builder.session(session);
        }
        builder.build()
    }
}

impl<I: AuthTokenIssuer> TokenProvider<I> {
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache_timeout(&self) -> Duration {
        self.cache_timeout
    }

    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Region used for a request: the explicit one, else the provider
    /// default, else the session's. Blank values count as absent.
    pub fn effective_region<'a>(&'a self, region: Option<&'a str>) -> Option<&'a str> {
        region
            .filter(|r| !r.trim().is_empty())
            .or(self.region_name.as_deref())
            .or(self.session.region())
    }

    /// Returns a token for `user@host:port`, from cache when still fresh.
    ///
    /// On a miss the issuer is called with the resolved region and the result
    /// is cached. The lookup, the issuer call and the store happen under one
    /// lock, so concurrent identical requests issue a single token.
    pub fn generate_auth_token(
        &self,
        user: &str,
        host: &str,
        port: u16,
        region: Option<&str>,
    ) -> Result<String, AuthError<I::Error>> {
        let region = self
            .effective_region(region)
            .ok_or(ConfigurationError::NoRegion)?;
        let key = CacheKey::new(user, host, port, region);
        let metrics = get_metrics();

        let mut issued = false;
        let token = self.cache.get_or_try_insert_with(key, |key| {
            issued = true;
            metrics.cache_misses.inc();
            let request = TokenRequest {
                hostname: key.host(),
                port: key.port(),
                username: key.user(),
                region: key.region(),
            };

            let timer = metrics.issue_duration.start_timer();
            let result = self.issuer.generate_db_auth_token(&request);
            timer.observe_duration();

            match result {
                Ok(token) => {
                    info!(key = %key, "issued new auth token");
                    Ok(token)
                }
                Err(error) => {
                    metrics.issue_failures.inc();
                    warn!(key = %key, error = %error, "token issuer failed");
                    Err(AuthError::Issuer(error))
                }
            }
        })?;

        if !issued {
            metrics.cache_hits.inc();
        }
        Ok(token)
    }

    /// Connection hook: fills `params.password` with a token for the
    /// parameters' user, host and port, using the configured region.
    ///
    /// No other field is touched; on failure the password is left as it was.
    pub fn provide_token(&self, params: &mut ConnectParams) -> Result<(), AuthError<I::Error>> {
        let token =
            self.generate_auth_token(&params.user, &params.host, params.port, self.region_name())?;
        debug!(user = %params.user, host = %params.host, port = params.port, "providing token as password");
        params.password = Some(token);
        Ok(())
    }
}

impl<I> TokenProvider<I>
where
    I: AuthTokenIssuer + 'static,
{
    /// [`generate_auth_token`](Self::generate_auth_token) on the blocking
    /// thread pool, for callers running inside a tokio runtime.
    pub async fn generate_auth_token_async(
        self: Arc<Self>,
        user: String,
        host: String,
        port: u16,
        region: Option<String>,
    ) -> Result<String, AuthError<I::Error>> {
        let handle = tokio::task::spawn_blocking(move || {
            self.generate_auth_token(&user, &host, port, region.as_deref())
        });
        match handle.await {
            Ok(result) => result,
            Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
        }
    }
}

impl<I: fmt::Debug> fmt::Debug for TokenProvider<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("region_name", &self.region_name)
            .field("session", &self.session)
            .field("cache_timeout", &self.cache_timeout)
            .field("issuer", &self.issuer)
            .field("cache", &self.cache)
            .finish()
    }
}
