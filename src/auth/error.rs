use thiserror::Error;

/// Invalid provider setup or an unresolvable request. Not retryable without
/// caller action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("cache_timeout must be 0 or positive, got {0}")]
    NegativeCacheTimeout(i64),
    #[error("no region available from the request, the provider or the session")]
    NoRegion,
    #[error("cannot load the ambient session: {0}")]
    SessionUnavailable(String),
}

/// Failure to produce a token.
///
/// Issuer failures are carried verbatim so callers can apply their own retry
/// policy against the original error.
#[derive(Debug, Error)]
pub enum AuthError<E> {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Issuer(E),
}

impl<E> AuthError<E> {
    pub fn is_configuration(&self) -> bool {
        matches!(self, AuthError::Configuration(_))
    }

    /// The issuer's own error, if that is what failed
    pub fn into_issuer(self) -> Option<E> {
        match self {
            AuthError::Issuer(e) => Some(e),
            AuthError::Configuration(_) => None,
        }
    }
}
