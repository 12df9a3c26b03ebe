//! Token-issuing clients.
//!
//! An [`AuthTokenIssuer`] turns `(hostname, port, username, region)` into a
//! token string. [`RdsTokenIssuer`] does it the way the RDS SDKs do: a SigV4
//! presigned `connect` request, computed locally from the session credentials.

mod sigv4;

use std::sync::Arc;

use thiserror::Error;

pub use sigv4::RdsTokenIssuer;

/// Parameters of a single token request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRequest<'a> {
    pub hostname: &'a str,
    pub port: u16,
    pub username: &'a str,
    pub region: &'a str,
}

/// External operation that issues database auth tokens.
///
/// Implementations must be callable from several threads at once; the
/// provider never mutates its issuer.
pub trait AuthTokenIssuer: Send + Sync {
    /// The error type returned in the event that issuing a token fails
    type Error: std::error::Error + Send + Sync + 'static;

    fn generate_db_auth_token(&self, request: &TokenRequest<'_>) -> Result<String, Self::Error>;
}

impl<T: AuthTokenIssuer + ?Sized> AuthTokenIssuer for Arc<T> {
    type Error = T::Error;

    fn generate_db_auth_token(&self, request: &TokenRequest<'_>) -> Result<String, Self::Error> {
        (**self).generate_db_auth_token(request)
    }
}

impl<T: AuthTokenIssuer + ?Sized> AuthTokenIssuer for &T {
    type Error = T::Error;

    fn generate_db_auth_token(&self, request: &TokenRequest<'_>) -> Result<String, Self::Error> {
        (**self).generate_db_auth_token(request)
    }
}

/// Failures of the built-in SigV4 signer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("no credentials available: {0}")]
    MissingCredentials(String),
    #[error("credentials expired and could not be refreshed")]
    ExpiredCredentials,
    #[error("token expiry must be between 1 and {max} seconds, got {got}")]
    InvalidExpiry { got: u64, max: u64 },
}
